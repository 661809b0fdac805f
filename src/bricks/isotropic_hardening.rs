use super::{check, declare_material_properties, DataMap, MaterialProperty, OptionDescription, OptionType};
use crate::base::{throw_runtime_error, BehaviourDescription, GenError};

/// Implements the isotropic hardening rules giving the radius `R` of the yield surface
///
/// The members of a rule are named `<option><fid>_<ihid>`; several rules of
/// one flow are summed.
#[derive(Clone, Debug, PartialEq)]
pub enum IsotropicHardeningRule {
    /// `R = R0 + H*p`
    Linear { r0: MaterialProperty, h: MaterialProperty },

    /// `R = Rinf + (R0-Rinf)*exp(-b*p)`
    Voce {
        r0: MaterialProperty,
        rinf: MaterialProperty,
        b: MaterialProperty,
    },
}

impl IsotropicHardeningRule {
    /// Returns the options of a rule given its name
    pub fn options(name: &str) -> Result<Vec<OptionDescription>, GenError> {
        let mp = |n: &str, d: &str| OptionDescription::new(n, d, OptionType::MaterialProperty);
        match name {
            "Linear" => Ok(vec![mp("R0", "yield strength"), mp("H", "hardening slope")]),
            "Voce" => Ok(vec![
                mp("R0", "yield strength"),
                mp("Rinf", "ultimate yield strength"),
                mp("b", "rate of convergence toward Rinf"),
            ]),
            _ => Err(throw_runtime_error(
                "IsotropicHardeningRuleFactory::generate",
                &format!("no isotropic hardening rule named '{}'", name),
            )),
        }
    }

    /// Reads a rule from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        check(name, d, &IsotropicHardeningRule::options(name)?)?;
        let r0 = MaterialProperty::required(name, d, "R0")?;
        if name == "Linear" {
            return Ok(IsotropicHardeningRule::Linear {
                r0,
                h: MaterialProperty::or_constant(d, "H", 0.0)?,
            });
        }
        Ok(IsotropicHardeningRule::Voce {
            r0,
            rinf: MaterialProperty::required(name, d, "Rinf")?,
            b: MaterialProperty::required(name, d, "b")?,
        })
    }

    /// Returns the name of a member of the rule
    fn id(option: &str, fid: &str, ihid: &str) -> String {
        format!("{}{}_{}", option, fid, ihid)
    }

    /// Declares the material properties of the rule
    pub fn initialize(&self, bd: &mut BehaviourDescription, fid: &str, ihid: &str) -> Result<(), GenError> {
        let id = |n: &str| IsotropicHardeningRule::id(n, fid, ihid);
        match self {
            IsotropicHardeningRule::Linear { r0, h } => {
                declare_material_properties(bd, &[(r0, "stress", id("R0")), (h, "stress", id("H"))])
            }
            IsotropicHardeningRule::Voce { r0, rinf, b } => declare_material_properties(
                bd,
                &[(r0, "stress", id("R0")), (rinf, "stress", id("Rinf")), (b, "real", id("b"))],
            ),
        }
    }

    /// Returns the expression of the radius for the given equivalent strain
    pub fn radius(&self, fid: &str, ihid: &str, p: &str) -> String {
        let id = |n: &str| format!("this->{}", IsotropicHardeningRule::id(n, fid, ihid));
        match self {
            IsotropicHardeningRule::Linear { .. } => format!("{}+({})*({})", id("R0"), id("H"), p),
            IsotropicHardeningRule::Voce { .. } => format!(
                "{}+({}-{})*exp(-({})*({}))",
                id("Rinf"),
                id("R0"),
                id("Rinf"),
                id("b"),
                p
            ),
        }
    }

    /// Returns the expression of the derivative of the radius with respect to the equivalent strain
    pub fn radius_derivative(&self, fid: &str, ihid: &str, p: &str) -> String {
        let id = |n: &str| format!("this->{}", IsotropicHardeningRule::id(n, fid, ihid));
        match self {
            IsotropicHardeningRule::Linear { .. } => id("H"),
            IsotropicHardeningRule::Voce { .. } => format!(
                "({})*({}-{})*exp(-({})*({}))",
                id("b"),
                id("Rinf"),
                id("R0"),
                id("b"),
                p
            ),
        }
    }
}

/// Returns the code declaring the radius `Rel<fid>` at the beginning of the time step
pub fn elastic_prediction(rules: &[IsotropicHardeningRule], fid: &str) -> String {
    let p = format!("this->p{}", fid);
    let terms: Vec<String> = rules
        .iter()
        .enumerate()
        .map(|(i, r)| format!("({})", r.radius(fid, &i.to_string(), &p)))
        .collect();
    format!("const auto Rel{} = {};\n", fid, terms.join("+"))
}

/// Returns the code declaring the radius `R<fid>` at the middle of the time step
///
/// With derivatives, `dR<fid>_ddp<fid>` is declared too.
pub fn radius(rules: &[IsotropicHardeningRule], fid: &str, derivatives: bool) -> String {
    let p = format!("(this->p{}+(this->theta)*(this->dp{}))", fid, fid);
    let ids: Vec<String> = (0..rules.len()).map(|i| i.to_string()).collect();
    let values: Vec<String> = rules
        .iter()
        .zip(ids.iter())
        .map(|(r, i)| format!("({})", r.radius(fid, i, &p)))
        .collect();
    let mut c = format!("const auto R{} = {};\n", fid, values.join("+"));
    if derivatives {
        let slopes: Vec<String> = rules
            .iter()
            .zip(ids.iter())
            .map(|(r, i)| format!("({})", r.radius_derivative(fid, i, &p)))
            .collect();
        c.push_str(&format!(
            "const auto dR{}_ddp{} = (this->theta)*({});\n",
            fid,
            fid,
            slopes.join("+")
        ));
    }
    c
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{elastic_prediction, radius, IsotropicHardeningRule};
    use crate::base::{new_sample_description, GenError, ModellingHypothesis, VariableCategory};
    use crate::bricks::{data_map, Data, MaterialProperty};

    #[test]
    fn new_works() {
        let d = data_map([("R0", Data::from(200e6)), ("H", Data::from(1e9))]);
        assert_eq!(
            IsotropicHardeningRule::new("Linear", &d),
            Ok(IsotropicHardeningRule::Linear {
                r0: MaterialProperty::Constant(200e6),
                h: MaterialProperty::Constant(1e9)
            })
        );
        let d = data_map([("R0", Data::from(200e6))]);
        assert_eq!(
            IsotropicHardeningRule::new("Voce", &d).err(),
            Some(GenError::Runtime(
                "Voce::initialize: material property 'Rinf' is not defined".to_string()
            ))
        );
        assert_eq!(
            IsotropicHardeningRule::new("Swift", &d).err(),
            Some(GenError::Runtime(
                "IsotropicHardeningRuleFactory::generate: no isotropic hardening rule named 'Swift'".to_string()
            ))
        );
    }

    #[test]
    fn radius_works() {
        let mut bd = new_sample_description("Plasticity");
        let linear = IsotropicHardeningRule::new("Linear", &data_map([("R0", Data::from(200e6))])).unwrap();
        let d = data_map([("R0", Data::from(1.0)), ("Rinf", Data::from(2.0)), ("b", Data::from("2*young"))]);
        let voce = IsotropicHardeningRule::new("Voce", &d).unwrap();
        linear.initialize(&mut bd, "", "0").unwrap();
        voce.initialize(&mut bd, "", "1").unwrap();
        let data = bd.data(ModellingHypothesis::Undefined);
        assert!(data.has_variable(VariableCategory::Parameter, "H_0"));
        assert!(data.has_variable(VariableCategory::LocalVariable, "b_1"));
        let rules = [linear, voce];
        assert_eq!(
            elastic_prediction(&rules[..1], ""),
            "const auto Rel = (this->R0_0+(this->H_0)*(this->p));\n"
        );
        let c = radius(&rules, "", true);
        assert!(c.starts_with("const auto R = (this->R0_0+(this->H_0)*((this->p+(this->theta)*(this->dp))))+"));
        assert!(c.contains("const auto dR_ddp = (this->theta)*((this->H_0)+((this->b_1)*(this->Rinf_1-this->R0_1)"));
    }
}
