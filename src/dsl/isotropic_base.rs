use super::{add_newton_parameters, check_hypotheses, declare_mid_step_external_state_variables, member_code};
use super::{set_epsilon, set_iter_max, set_theta};
use crate::base::{throw_runtime_error, BehaviourDescription, CodeBlockSlot, GenError, Mode, ModellingHypothesis};
use crate::base::{Position, VariableCategory, VariableDescription, ATTRIBUTE_STRESS_UPDATE_ALGORITHM};

/// Hypotheses supported by the isotropic DSLs (plane stress is not)
pub const ISOTROPIC_HYPOTHESES: [ModellingHypothesis; 5] = [
    ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain,
    ModellingHypothesis::Axisymmetrical,
    ModellingHypothesis::PlaneStrain,
    ModellingHypothesis::GeneralisedPlaneStrain,
    ModellingHypothesis::Tridimensional,
];

/// Code blocks the user may give to an isotropic DSL
const USER_SLOTS: [CodeBlockSlot; 5] = [
    CodeBlockSlot::InitializeLocalVariables,
    CodeBlockSlot::UpdateAuxiliaryStateVariables,
    CodeBlockSlot::ComputePredictionOperator,
    CodeBlockSlot::APrioriTimeStepScalingFactor,
    CodeBlockSlot::APosterioriTimeStepScalingFactor,
];

/// Holds what is common to the DSLs based on isotropic elasticity and a Mises flow direction
///
/// The elastic properties and the user code are treated when the
/// description is completed, so that formulas and flow rules can refer to
/// any variable declared before.
#[derive(Clone, Debug)]
pub(crate) struct IsotropicBehaviourBase {
    /// Name of the DSL, used in error messages
    pub dsl: &'static str,

    /// Description being built
    pub bd: BehaviourDescription,

    /// Young's modulus as a function of the temperature, if not a material property
    young_formula: Option<String>,

    /// Poisson's ratio as a function of the temperature, if not a material property
    nu_formula: Option<String>,

    /// User code (slot, raw code)
    blocks: Vec<(CodeBlockSlot, String)>,
}

impl IsotropicBehaviourBase {
    /// Declares the variables common to all isotropic DSLs
    pub fn new(dsl: &'static str, name: &str, theta: f64) -> Result<Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        let mut bd = BehaviourDescription::new(name)?;
        bd.set_modelling_hypotheses(&ISOTROPIC_HYPOTHESES)?;
        bd.reserve_name(h, "NewtonIntegration")?;
        add_newton_parameters(&mut bd, theta)?;
        for name in ["lambda", "mu", "lambda_tdt", "mu_tdt"] {
            bd.add_local_variable(h, VariableDescription::new("stress", name)?)?;
        }
        let eel = VariableDescription::new("StrainStensor", "eel")?.with_glossary_name("ElasticStrain");
        bd.add_state_variable(h, eel)?;
        bd.add_local_variable(h, VariableDescription::new("StressStensor", "se")?)?;
        bd.add_local_variable(h, VariableDescription::new("stress", "seq")?)?;
        bd.add_local_variable(h, VariableDescription::new("stress", "seq_e")?)?;
        bd.add_local_variable(h, VariableDescription::new("StrainStensor", "n")?)?;
        bd.has_consistent_tangent_operator = true;
        bd.is_consistent_tangent_operator_symmetric = true;
        Ok(IsotropicBehaviourBase {
            dsl,
            bd,
            young_formula: None,
            nu_formula: None,
            blocks: Vec::new(),
        })
    }

    pub fn set_modelling_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<(), GenError> {
        check_hypotheses(self.dsl, &ISOTROPIC_HYPOTHESES, hypotheses)?;
        self.bd.set_modelling_hypotheses(hypotheses)?;
        Ok(())
    }

    pub fn set_theta(&mut self, value: f64) -> Result<(), GenError> {
        set_theta(&mut self.bd, self.dsl, value)
    }

    pub fn set_epsilon(&mut self, value: f64) -> Result<(), GenError> {
        set_epsilon(&mut self.bd, self.dsl, value)
    }

    pub fn set_iter_max(&mut self, value: usize) -> Result<(), GenError> {
        set_iter_max(&mut self.bd, self.dsl, value)
    }

    /// Adds a user variable
    ///
    /// State variables are not accepted: they are the integration unknowns of
    /// the DSL. Auxiliary state variables must be used instead.
    pub fn add_variable(&mut self, category: VariableCategory, variable: VariableDescription) -> Result<(), GenError> {
        if category == VariableCategory::StateVariable || category == VariableCategory::IntegrationVariable {
            return Err(throw_runtime_error(
                &format!("{}::addVariable", self.dsl),
                &format!(
                    "'{}': state and integration variables are not allowed, use auxiliary state variables",
                    variable.name
                ),
            ));
        }
        self.bd.add_variable(ModellingHypothesis::Undefined, category, variable)
    }

    pub fn add_parameter(&mut self, variable: VariableDescription, default: f64) -> Result<(), GenError> {
        self.bd.add_parameter(ModellingHypothesis::Undefined, variable, default)
    }

    /// Defines Young's modulus and Poisson's ratio as functions of the temperature `T`
    pub fn set_elastic_formulas(&mut self, young: Option<&str>, nu: Option<&str>) {
        self.young_formula = young.map(|s| s.to_string());
        self.nu_formula = nu.map(|s| s.to_string());
    }

    /// Adds user code to a slot
    pub fn add_code(&mut self, slot: CodeBlockSlot, code: &str) -> Result<(), GenError> {
        if !USER_SLOTS.contains(&slot) {
            return Err(throw_runtime_error(
                &format!("{}::addCode", self.dsl),
                &format!("the code block '{}' can't be defined by this DSL", slot.name()),
            ));
        }
        self.blocks.push((slot, code.to_string()));
        Ok(())
    }

    /// Rebuilds the elastic strain from the stress at the beginning of each step
    pub fn set_stress_update_algorithm(&mut self, flag: bool) -> Result<(), GenError> {
        self.bd
            .set_attribute(ModellingHypothesis::Undefined, ATTRIBUTE_STRESS_UPDATE_ALGORITHM, flag)
    }

    /// Declares the elastic properties and the mid-step external state variables, then treats the user code
    pub fn complete(&mut self) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let properties = [
            ("stress", "young", "YoungModulus", self.young_formula.clone()),
            ("real", "nu", "PoissonRatio", self.nu_formula.clone()),
        ];
        for (type_name, name, glossary, formula) in &properties {
            if formula.is_some() {
                self.bd.add_local_variable(h, VariableDescription::new(type_name, name)?)?;
            } else {
                let v = VariableDescription::new(type_name, name)?.with_glossary_name(glossary);
                self.bd.add_material_property(h, v)?;
            }
        }
        self.bd.set_elastic_material_properties(&["young", "nu"])?;
        for (_, name, _, formula) in &properties {
            if let Some(f) = formula {
                self.bd.set_elastic_material_property_formula(name, f)?;
            }
        }
        declare_mid_step_external_state_variables(&mut self.bd)?;
        for (slot, code) in std::mem::take(&mut self.blocks) {
            let block = member_code(self.bd.data(h), &code, false, &[]);
            self.bd.set_code(h, slot, block, Mode::CreateOrAppend, Position::AtEnd)?;
        }
        Ok(())
    }

    /// Stores a flow rule, accessing members through `this` and external state variables at mid-step
    pub fn set_flow_rule(&mut self, code: &str) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let block = member_code(self.bd.data(h), code, true, &[]);
        self.bd.set_code(h, CodeBlockSlot::FlowRule, block, Mode::Create, Position::AtEnd)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{IsotropicBehaviourBase, ISOTROPIC_HYPOTHESES};
    use crate::base::{CodeBlockSlot, GenError, ModellingHypothesis, VariableCategory, VariableDescription};

    #[test]
    fn new_works() {
        let h = ModellingHypothesis::Undefined;
        let base = IsotropicBehaviourBase::new("IsotropicMisesCreep", "Norton", 0.5).unwrap();
        assert_eq!(base.bd.modelling_hypotheses(), ISOTROPIC_HYPOTHESES.to_vec());
        let data = base.bd.data(h);
        assert_eq!(data.parameter_default("theta"), Some(0.5));
        assert_eq!(data.parameter_default("iterMax"), Some(100.0));
        assert!(data.has_variable(VariableCategory::StateVariable, "eel"));
        assert!(data.has_variable(VariableCategory::LocalVariable, "mu_tdt"));
        assert!(base.bd.has_consistent_tangent_operator);
    }

    #[test]
    fn complete_works() {
        let h = ModellingHypothesis::Undefined;
        let mut base = IsotropicBehaviourBase::new("IsotropicMisesCreep", "Norton", 0.5).unwrap();
        base.set_elastic_formulas(Some("150e9-1e7*T"), None);
        base.add_code(CodeBlockSlot::InitializeLocalVariables, "seq = 0;").unwrap();
        base.complete().unwrap();
        let data = base.bd.data(h);
        assert!(data.has_variable(VariableCategory::LocalVariable, "young"));
        assert!(data.has_variable(VariableCategory::MaterialProperty, "nu"));
        assert!(data.has_variable(VariableCategory::LocalVariable, "T_"));
        assert_eq!(base.bd.elastic_material_property_formula("young"), Some("150e9-1e7*T"));
        assert_eq!(
            base.bd.code(h, CodeBlockSlot::InitializeLocalVariables).unwrap().code,
            "this->seq = 0;"
        );
    }

    #[test]
    fn base_captures_errors() {
        let mut base = IsotropicBehaviourBase::new("IsotropicMisesCreep", "Norton", 0.5).unwrap();
        assert_eq!(
            base.set_modelling_hypotheses(&[ModellingHypothesis::PlaneStress]).err(),
            Some(GenError::Runtime(
                "IsotropicMisesCreep::setModellingHypotheses: unsupported modelling hypothesis 'PlaneStress'"
                    .to_string()
            ))
        );
        let v = VariableDescription::new("strain", "q").unwrap();
        assert_eq!(
            base.add_variable(VariableCategory::StateVariable, v).err(),
            Some(GenError::Runtime(
                "IsotropicMisesCreep::addVariable: 'q': state and integration variables are not allowed, use auxiliary state variables"
                    .to_string()
            ))
        );
        assert_eq!(
            base.add_code(CodeBlockSlot::Integrator, "").err(),
            Some(GenError::Runtime(
                "IsotropicMisesCreep::addCode: the code block 'Integrator' can't be defined by this DSL".to_string()
            ))
        );
    }
}
