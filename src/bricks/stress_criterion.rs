use super::{append_initialization_code, check, declare_material_properties, reserve_names, add_local_variable};
use super::{DataMap, HillCoefficients, MaterialProperty, OptionDescription, OptionType};
use crate::base::{throw_runtime_error, BehaviourDescription, GenError};

/// Defines how a stress criterion is used by an inelastic flow
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CriterionRole {
    /// Defines the yield surface only
    Stress,

    /// Defines the flow direction only (non associated flow)
    Flow,

    /// Defines both the yield surface and the flow direction
    StressAndFlow,
}

impl CriterionRole {
    /// Returns the suffix appended to the members of the criterion
    pub fn suffix(&self) -> &'static str {
        match self {
            CriterionRole::Flow => "f",
            _ => "",
        }
    }

    /// Indicates that the criterion gives the equivalent stress of the yield surface
    pub fn is_stress(&self) -> bool {
        !matches!(self, CriterionRole::Flow)
    }
}

/// Holds the options of the Gurson-Tvergaard-Needleman criterion and the fields they set
const GTN_PARAMETERS: [(&str, &str); 5] = [("q1", "q_1"), ("q2", "q_2"), ("q3", "q_3"), ("f_c", "f_c"), ("f_r", "f_r")];

/// Holds the options of the Rousselier criterion and the fields they set
const ROUSSELIER_PARAMETERS: [(&str, &str); 3] = [("D", "DR"), ("f0", "f0"), ("qR", "qR")];

/// Implements the stress criteria
///
/// Each criterion writes the equivalent stress `seq<id>` of the effective
/// stress `s<id>`, its normal `dseq<id>_ds<id>` and, when the jacobian is
/// analytical, the second derivative `d2seq<id>_ds<id>ds<id>`. Porous
/// criteria also depend on the mid-step porosity `<f>_`.
#[derive(Clone, Debug, PartialEq)]
pub enum StressCriterion {
    Mises,

    /// Quadratic orthotropic criterion built from 6 coefficients
    Hill(HillCoefficients),

    /// Porous criterion (q1, q2, q3, f_c, f_r)
    GursonTvergaardNeedleman1982(Vec<MaterialProperty>),

    /// Porous criterion (D, f0, qR)
    Rousselier(Vec<MaterialProperty>),
}

impl StressCriterion {
    /// Returns the options of a criterion given its name
    pub fn options(name: &str) -> Result<Vec<OptionDescription>, GenError> {
        let mp = |(n, _): &(&str, &str)| OptionDescription::new(n, "", OptionType::MaterialProperty);
        match name {
            "Mises" => Ok(Vec::new()),
            "Hill" => Ok(vec![OptionDescription::new(
                "H",
                "Hill coefficients F, G, H, L, M, N",
                OptionType::ArrayOfMaterialProperties,
            )]),
            "GursonTvergaardNeedleman1982" => Ok(GTN_PARAMETERS.iter().map(mp).collect()),
            "Rousselier" => Ok(ROUSSELIER_PARAMETERS.iter().map(mp).collect()),
            _ => Err(throw_runtime_error(
                "StressCriterionFactory::generate",
                &format!("no stress criterion named '{}'", name),
            )),
        }
    }

    /// Reads a criterion from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        check(name, d, &StressCriterion::options(name)?)?;
        let read = |table: &[(&str, &str)]| -> Result<Vec<MaterialProperty>, GenError> {
            table
                .iter()
                .map(|(n, _)| MaterialProperty::required(name, d, n))
                .collect()
        };
        match name {
            "Hill" => Ok(StressCriterion::Hill(HillCoefficients::from_data("H", d)?)),
            "GursonTvergaardNeedleman1982" => Ok(StressCriterion::GursonTvergaardNeedleman1982(read(&GTN_PARAMETERS)?)),
            "Rousselier" => Ok(StressCriterion::Rousselier(read(&ROUSSELIER_PARAMETERS)?)),
            _ => Ok(StressCriterion::Mises),
        }
    }

    /// Returns the name of the criterion
    pub fn name(&self) -> &'static str {
        match self {
            StressCriterion::Mises => "Mises",
            StressCriterion::Hill(_) => "Hill",
            StressCriterion::GursonTvergaardNeedleman1982(_) => "GursonTvergaardNeedleman1982",
            StressCriterion::Rousselier(_) => "Rousselier",
        }
    }

    /// Indicates that the criterion depends on the porosity
    pub fn is_coupled_with_porosity_evolution(&self) -> bool {
        matches!(
            self,
            StressCriterion::GursonTvergaardNeedleman1982(_) | StressCriterion::Rousselier(_)
        )
    }

    /// Indicates that the normal is deviatoric (no volume change)
    pub fn is_normal_deviatoric(&self) -> bool {
        !self.is_coupled_with_porosity_evolution()
    }

    /// Returns the name and the parameters of the criteria implemented by TFEL
    fn standard(&self) -> Option<(&'static str, &'static str, &'static [(&'static str, &'static str)], &[MaterialProperty])> {
        match self {
            StressCriterion::GursonTvergaardNeedleman1982(mps) => {
                Some(("GursonTvergaardNeedleman1982", "gtn", &GTN_PARAMETERS, mps.as_slice()))
            }
            StressCriterion::Rousselier(mps) => {
                Some(("RousselierTanguyBesson2002", "rousselier", &ROUSSELIER_PARAMETERS, mps.as_slice()))
            }
            _ => None,
        }
    }

    /// Returns the name of the Hill tensor of the criterion
    fn hill_tensor(id: &str, role: CriterionRole) -> String {
        format!("hill{}{}", id, role.suffix())
    }

    /// Returns the name of the parameters structure of a standard criterion
    fn parameters_name(id: &str, role: CriterionRole) -> String {
        format!("sscb_parameters{}{}", id, role.suffix())
    }

    /// Declares the members of the criterion
    pub fn initialize(&self, bd: &mut BehaviourDescription, id: &str, role: CriterionRole) -> Result<(), GenError> {
        let sfx = role.suffix();
        let reserved = if role.is_stress() {
            vec![format!("s{}", id), format!("n{}", id), format!("seq{}", id), format!("seqel{}", id)]
        } else {
            vec![format!("seqf{}", id)]
        };
        reserve_names(bd, &reserved)?;
        match self {
            StressCriterion::Mises => Ok(()),
            StressCriterion::Hill(coefficients) => coefficients.declare(bd, &StressCriterion::hill_tensor(id, role)),
            _ => {
                if let Some((name, prefix, table, mps)) = self.standard() {
                    let ids: Vec<String> = table.iter().map(|(n, _)| format!("{}_{}{}{}", prefix, n, id, sfx)).collect();
                    let entries: Vec<(&MaterialProperty, &str, String)> =
                        mps.iter().zip(ids.iter()).map(|(mp, n)| (mp, "real", n.clone())).collect();
                    declare_material_properties(bd, &entries)?;
                    let params = StressCriterion::parameters_name(id, role);
                    add_local_variable(bd, &format!("{}StressCriterionParameters<StressStensor>", name), &params)?;
                    bd.append_include(&format!("TFEL/Material/{}StressCriterion.hxx", name));
                    let mut code = String::new();
                    for ((_, field), n) in table.iter().zip(ids.iter()) {
                        code.push_str(&format!("this->{}.{} = this->{};\n", params, field, n));
                    }
                    append_initialization_code(bd, &code, &[&params])?;
                }
                Ok(())
            }
        }
    }

    /// Returns the code computing the equivalent stress of the elastic prediction `sel<id>`
    pub fn elastic_prediction(&self, id: &str, lower_bound: &str, porosity: Option<&str>) -> Result<String, GenError> {
        let s = format!("sel{}", id);
        let value = self.equivalent_stress(id, CriterionRole::Stress, &s, lower_bound, porosity.map(|f| format!("this->{}", f)))?;
        Ok(format!("const auto seqel{} = {};\n", id, value))
    }

    /// Returns the code computing the equivalent stress `seq<id>` of the effective stress
    pub fn criterion(&self, id: &str, lower_bound: &str, porosity: Option<&str>) -> Result<String, GenError> {
        let s = format!("s{}", id);
        let value = self.equivalent_stress(id, CriterionRole::Stress, &s, lower_bound, porosity.map(|f| format!("{}_", f)))?;
        Ok(format!("const auto seq{} = {};\n", id, value))
    }

    /// Returns the expression of the equivalent stress of `s`
    fn equivalent_stress(
        &self,
        id: &str,
        role: CriterionRole,
        s: &str,
        lower_bound: &str,
        porosity: Option<String>,
    ) -> Result<String, GenError> {
        match self {
            StressCriterion::Mises => Ok(format!("sigmaeq({})", s)),
            StressCriterion::Hill(_) => Ok(format!(
                "sqrt(max({}|(this->{})*{},real(0)))",
                s,
                StressCriterion::hill_tensor(id, role),
                s
            )),
            _ => {
                let f = porosity.ok_or_else(|| self.missing_porosity())?;
                let (name, ..) = self.standard().ok_or_else(|| self.missing_porosity())?;
                Ok(format!(
                    "compute{}Stress({}, {}, this->{}, {})",
                    name,
                    s,
                    f,
                    StressCriterion::parameters_name(id, role),
                    lower_bound
                ))
            }
        }
    }

    fn missing_porosity(&self) -> GenError {
        throw_runtime_error(
            &format!("{}StressCriterion", self.name()),
            "the porosity is not defined",
        )
    }

    /// Returns the code computing the normal (and its derivatives if `derivatives` is true)
    ///
    /// The stress role declares `seq<id>` and `dseq<id>_ds<id>`; the flow role
    /// declares `seqf<id>` and `n<id>`; when the criterion has both roles,
    /// `n<id>` refers to `dseq<id>_ds<id>`. With derivatives, `d2seq<id>_ds<id>ds<id>`
    /// and `dn<id>_ds<id>` are also declared (and their derivatives with respect
    /// to the porosity for porous criteria).
    pub fn normal(
        &self,
        id: &str,
        role: CriterionRole,
        lower_bound: &str,
        porosity: Option<&str>,
        derivatives: bool,
    ) -> Result<String, GenError> {
        let s = format!("s{}", id);
        let n = format!("n{}", id);
        let mut c = String::new();
        if let Some((name, ..)) = self.standard() {
            let f = porosity.ok_or_else(|| self.missing_porosity())?;
            let f_ = format!("{}_", f);
            let params = StressCriterion::parameters_name(id, role);
            let call = |suffix: &str| {
                format!(
                    "compute{}Stress{}({}, {}, this->{}, {});\n",
                    name, suffix, s, f_, params, lower_bound
                )
            };
            let seq = format!("seq{}", id);
            if role.is_stress() {
                if derivatives {
                    c.push_str(&format!(
                        "const auto [{seq},d{seq}_d{s},d{seq}_d{f},d2{seq}_d{s}d{s},d2{seq}_d{s}d{f}] = ",
                        seq = seq,
                        s = s,
                        f = f
                    ));
                    c.push_str(&call("SecondDerivative"));
                } else {
                    c.push_str(&format!("const auto [{seq},d{seq}_d{s}] = ", seq = seq, s = s));
                    c.push_str(&call("Normal"));
                }
                if role == CriterionRole::StressAndFlow {
                    c.push_str(&format!("const auto& {} = d{}_d{};\n", n, seq, s));
                    if derivatives {
                        c.push_str(&format!("const auto& d{n}_d{s} = d2{seq}_d{s}d{s};\n", n = n, seq = seq, s = s));
                        c.push_str(&format!("const auto& d{n}_d{f} = d2{seq}_d{s}d{f};\n", n = n, seq = seq, s = s, f = f));
                    }
                }
            } else if derivatives {
                c.push_str(&format!(
                    "const auto [seqf{id},{n},d{seq}f_d{f},d{n}_d{s},d{n}_d{f}] = ",
                    id = id,
                    seq = seq,
                    n = n,
                    s = s,
                    f = f
                ));
                c.push_str(&call("SecondDerivative"));
            } else {
                c.push_str(&format!("const auto [seqf{},{}] = ", id, n));
                c.push_str(&call("Normal"));
            }
            return Ok(c);
        }
        // Mises and Hill: explicit expressions
        let (seq, normal) = match role {
            CriterionRole::Flow => (format!("seqf{}", id), n.clone()),
            _ => (format!("seq{}", id), format!("dseq{}_d{}", id, s)),
        };
        let iseq = format!("i{}", seq);
        c.push_str(&format!(
            "const auto {} = {};\n",
            seq,
            self.equivalent_stress(id, role, &s, lower_bound, None)?
        ));
        c.push_str(&format!("const auto {} = 1/(max({},{}));\n", iseq, seq, lower_bound));
        let second = match role {
            CriterionRole::Flow => format!("d{}_d{}", n, s),
            _ => format!("d2seq{}_d{}d{}", id, s, s),
        };
        match self {
            StressCriterion::Hill(_) => {
                let hill = format!("this->{}", StressCriterion::hill_tensor(id, role));
                c.push_str(&format!("const auto {} = eval((({})*{})*{});\n", normal, hill, s, iseq));
                if derivatives {
                    c.push_str(&format!(
                        "const auto {} = eval(({}-({}^{}))*{});\n",
                        second, hill, normal, normal, iseq
                    ));
                }
            }
            _ => {
                c.push_str(&format!("const auto {} = eval(3*deviator({})*({}/2));\n", normal, s, iseq));
                if derivatives {
                    c.push_str(&format!(
                        "const auto {} = eval((Stensor4::M()-({}^{}))*{});\n",
                        second, normal, normal, iseq
                    ));
                }
            }
        }
        if role == CriterionRole::StressAndFlow {
            c.push_str(&format!("const auto& {} = {};\n", n, normal));
            if derivatives {
                c.push_str(&format!("const auto& d{}_d{} = {};\n", n, s, second));
            }
        }
        Ok(c)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{CriterionRole, StressCriterion};
    use crate::base::{new_sample_description, CodeBlockSlot, GenError, ModellingHypothesis, VariableCategory};
    use crate::bricks::{data_map, Data};

    #[test]
    fn new_works() {
        let mises = StressCriterion::new("Mises", &data_map([])).unwrap();
        assert_eq!(mises.name(), "Mises");
        assert!(mises.is_normal_deviatoric());
        let d = data_map([
            ("q1", Data::from(1.5)),
            ("q2", Data::from(1.0)),
            ("q3", Data::from(2.25)),
            ("f_c", Data::from(0.01)),
            ("f_r", Data::from(0.1)),
        ]);
        let gtn = StressCriterion::new("GursonTvergaardNeedleman1982", &d).unwrap();
        assert!(gtn.is_coupled_with_porosity_evolution());
    }

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            StressCriterion::new("Tresca", &data_map([])).err(),
            Some(GenError::Runtime(
                "StressCriterionFactory::generate: no stress criterion named 'Tresca'".to_string()
            ))
        );
        assert_eq!(
            StressCriterion::new("Rousselier", &data_map([("D", Data::from(2.0))])).err(),
            Some(GenError::Runtime(
                "Rousselier::initialize: material property 'f0' is not defined".to_string()
            ))
        );
        assert_eq!(
            StressCriterion::new("Mises", &data_map([("H", Data::from(1.0))])).err(),
            Some(GenError::UnknownOption {
                brick: "Mises".to_string(),
                option: "H".to_string()
            })
        );
    }

    #[test]
    fn mises_normal_works() {
        let mises = StressCriterion::Mises;
        let c = mises.normal("", CriterionRole::StressAndFlow, "lb", None, true).unwrap();
        assert!(c.contains("const auto seq = sigmaeq(s);"));
        assert!(c.contains("const auto iseq = 1/(max(seq,lb));"));
        assert!(c.contains("const auto dseq_ds = eval(3*deviator(s)*(iseq/2));"));
        assert!(c.contains("const auto d2seq_dsds = eval((Stensor4::M()-(dseq_ds^dseq_ds))*iseq);"));
        assert!(c.contains("const auto& n = dseq_ds;"));
        assert!(c.contains("const auto& dn_ds = d2seq_dsds;"));
        let c = mises.normal("1", CriterionRole::Flow, "lb", None, false).unwrap();
        assert!(c.contains("const auto n1 = eval(3*deviator(s1)*(iseqf1/2));"));
        assert_eq!(mises.criterion("1", "lb", None).unwrap(), "const auto seq1 = sigmaeq(s1);\n");
        assert_eq!(
            mises.elastic_prediction("", "lb", None).unwrap(),
            "const auto seqel = sigmaeq(sel);\n"
        );
    }

    #[test]
    fn porous_criterion_works() {
        let h = ModellingHypothesis::Undefined;
        let mut bd = new_sample_description("Porous");
        let d = data_map([("D", Data::from(2.0)), ("f0", Data::from(0.01)), ("qR", Data::from(0.9))]);
        let rousselier = StressCriterion::new("Rousselier", &d).unwrap();
        rousselier.initialize(&mut bd, "", CriterionRole::StressAndFlow).unwrap();
        let data = bd.data(h);
        assert!(data.has_variable(VariableCategory::Parameter, "rousselier_D"));
        assert!(data.has_variable(VariableCategory::LocalVariable, "sscb_parameters"));
        assert_eq!(
            bd.includes(),
            &["TFEL/Material/RousselierTanguyBesson2002StressCriterion.hxx".to_string()]
        );
        let init = &bd.code(h, CodeBlockSlot::BeforeInitializeLocalVariables).unwrap().code;
        assert!(init.contains("this->sscb_parameters.DR = this->rousselier_D;"));
        let c = rousselier
            .normal("", CriterionRole::StressAndFlow, "lb", Some("f"), true)
            .unwrap();
        assert!(c.starts_with("const auto [seq,dseq_ds,dseq_df,d2seq_dsds,d2seq_dsdf] = "));
        assert!(c.contains("computeRousselierTanguyBesson2002StressSecondDerivative(s, f_, this->sscb_parameters, lb);"));
        assert!(c.contains("const auto& dn_df = d2seq_dsdf;"));
        assert_eq!(
            rousselier.criterion("", "lb", None).err(),
            Some(GenError::Runtime(
                "RousselierStressCriterion: the porosity is not defined".to_string()
            ))
        );
    }

    #[test]
    fn hill_criterion_works() {
        let mut bd = new_sample_description("Hill");
        bd.set_modelling_hypotheses(&[ModellingHypothesis::Tridimensional]).unwrap();
        let values = Data::Array(vec![Data::from(0.5); 6]);
        let hill = StressCriterion::new("Hill", &data_map([("H", values)])).unwrap();
        hill.initialize(&mut bd, "", CriterionRole::StressAndFlow).unwrap();
        assert!(bd
            .data(ModellingHypothesis::Undefined)
            .has_variable(VariableCategory::LocalVariable, "hill"));
        let c = hill.normal("", CriterionRole::StressAndFlow, "lb", None, false).unwrap();
        assert!(c.contains("const auto seq = sqrt(max(s|(this->hill)*s,real(0)));"));
        assert!(c.contains("const auto dseq_ds = eval(((this->hill)*s)*iseq);"));
    }
}
