use crate::base::{throw_runtime_error, BehaviourData, BehaviourDescription, BehaviourParameters, Bounds, CodeBlock};
use crate::base::{GenError, GeneratorConfig, ModellingHypothesis, VariableCategory, VariableDescription};
use crate::base::{DEFAULT_EPSILON, DEFAULT_ITER_MAX};
use crate::codegen::{rewrite_identifiers, BehaviourCodeGenerator, GeneratedFiles, LocalSolveStrategy};
use std::collections::BTreeSet;

/// Holds a behaviour ready to be generated
#[derive(Clone, Debug, PartialEq)]
pub struct Behaviour {
    /// Description of the behaviour
    pub description: BehaviourDescription,

    /// Local integration algorithm
    pub strategy: LocalSolveStrategy,
}

impl Behaviour {
    /// Returns the default values of the parameters
    pub fn parameters(&self) -> BehaviourParameters {
        BehaviourParameters::new(self.description.data(ModellingHypothesis::Undefined))
    }

    /// Generates the files of the behaviour
    pub fn generate(&self, config: &GeneratorConfig) -> Result<GeneratedFiles, GenError> {
        BehaviourCodeGenerator::new(&self.description, config, &self.strategy).generate()
    }

    /// Generates the files of the behaviour with overridden parameters
    pub fn generate_with_parameters(
        &self,
        config: &GeneratorConfig,
        parameters: &BehaviourParameters,
    ) -> Result<GeneratedFiles, GenError> {
        BehaviourCodeGenerator::new(&self.description, config, &self.strategy)
            .with_parameters(parameters)
            .generate()
    }
}

/// Rewrites user code so that members are accessed through `this`
///
/// With `mid_step`, external state variables are replaced by their value at
/// the middle of the time step (the local variable `<name>_`). Names listed
/// in `excluded` are left untouched (e.g. arguments of a generated method).
pub fn member_code(data: &BehaviourData, code: &str, mid_step: bool, excluded: &[&str]) -> CodeBlock {
    let externals: BTreeSet<&str> = data
        .variables(VariableCategory::ExternalStateVariable)
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    let mut members = BTreeSet::new();
    let rewritten = rewrite_identifiers(code, |word| {
        if excluded.contains(&word) {
            return None;
        }
        if mid_step && externals.contains(word) {
            let local = format!("{}_", word);
            if data.has_variable(VariableCategory::LocalVariable, &local) {
                let replacement = format!("this->{}", local);
                members.insert(local);
                return Some(replacement);
            }
        }
        if data.registered_names().contains(word) {
            members.insert(word.to_string());
            Some(format!("this->{}", word))
        } else {
            None
        }
    });
    CodeBlock {
        code: rewritten,
        members,
    }
}

/// Declares the parameters `theta`, `epsilon` and `iterMax` of the local Newton algorithms
pub fn add_newton_parameters(bd: &mut BehaviourDescription, theta: f64) -> Result<(), GenError> {
    let h = ModellingHypothesis::Undefined;
    let v = VariableDescription::new("real", "theta")?.with_bounds(Bounds::range(0.0, 1.0));
    bd.add_parameter(h, v, theta)?;
    let v = VariableDescription::new("real", "epsilon")?.with_bounds(Bounds::lower(0.0));
    bd.add_parameter(h, v, DEFAULT_EPSILON)?;
    let v = VariableDescription::new("real", "iterMax")?.with_bounds(Bounds::lower(1.0));
    bd.add_parameter(h, v, DEFAULT_ITER_MAX as f64)?;
    Ok(())
}

/// Changes the default value of `theta` (must be in `[0,1]`)
pub fn set_theta(bd: &mut BehaviourDescription, dsl: &str, value: f64) -> Result<(), GenError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(throw_runtime_error(
            &format!("{}::treatTheta", dsl),
            "theta value must be positive and smaller than 1",
        ));
    }
    bd.set_parameter_default(ModellingHypothesis::Undefined, "theta", value)
}

/// Changes the default value of `epsilon` (must be positive)
pub fn set_epsilon(bd: &mut BehaviourDescription, dsl: &str, value: f64) -> Result<(), GenError> {
    if !(value >= 0.0) {
        return Err(throw_runtime_error(
            &format!("{}::treatEpsilon", dsl),
            "epsilon value must be positive",
        ));
    }
    bd.set_parameter_default(ModellingHypothesis::Undefined, "epsilon", value)
}

/// Changes the default value of `iterMax` (must be strictly positive)
pub fn set_iter_max(bd: &mut BehaviourDescription, dsl: &str, value: usize) -> Result<(), GenError> {
    if value == 0 {
        return Err(throw_runtime_error(
            &format!("{}::treatIterMax", dsl),
            "invalid value for parameter 'iterMax'",
        ));
    }
    bd.set_parameter_default(ModellingHypothesis::Undefined, "iterMax", value as f64)
}

/// Declares the local variable `<v>_` holding each external state variable at the middle of the step
pub fn declare_mid_step_external_state_variables(bd: &mut BehaviourDescription) -> Result<(), GenError> {
    let h = ModellingHypothesis::Undefined;
    let externals = bd.data(h).variables(VariableCategory::ExternalStateVariable).to_vec();
    for v in externals {
        let name = format!("{}_", v.name);
        if !bd.data(h).has_variable(VariableCategory::LocalVariable, &name) {
            bd.add_local_variable(h, VariableDescription::new(&v.type_name, &name)?)?;
        }
    }
    Ok(())
}

/// Checks that the requested hypotheses are among the supported ones
pub fn check_hypotheses(
    dsl: &str,
    supported: &[ModellingHypothesis],
    requested: &[ModellingHypothesis],
) -> Result<(), GenError> {
    if let Some(h) = requested.iter().find(|h| !supported.contains(h)) {
        return Err(throw_runtime_error(
            &format!("{}::setModellingHypotheses", dsl),
            &format!("unsupported modelling hypothesis '{}'", h.name()),
        ));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{add_newton_parameters, check_hypotheses, declare_mid_step_external_state_variables, member_code};
    use super::{set_epsilon, set_iter_max, set_theta};
    use crate::base::{new_sample_description, GenError, ModellingHypothesis, VariableCategory};

    #[test]
    fn member_code_works() {
        let h = ModellingHypothesis::Undefined;
        let mut bd = new_sample_description("Norton");
        declare_mid_step_external_state_variables(&mut bd).unwrap();
        let data = bd.data(h);
        assert!(data.has_variable(VariableCategory::LocalVariable, "T_"));
        let block = member_code(data, "const auto E = young*(1-1e-4*T); // young", false, &[]);
        assert_eq!(block.code, "const auto E = this->young*(1-1e-4*this->T); // young");
        assert_eq!(block.members.iter().collect::<Vec<_>>(), &["T", "young"]);
        let block = member_code(data, "f = young*p*T;", true, &["f"]);
        assert_eq!(block.code, "f = this->young*this->p*this->T_;");
        assert!(block.members.contains("T_"));
    }

    #[test]
    fn newton_parameters_work() {
        let h = ModellingHypothesis::Undefined;
        let mut bd = new_sample_description("Norton");
        add_newton_parameters(&mut bd, 0.5).unwrap();
        set_theta(&mut bd, "IsotropicDsl", 1.0).unwrap();
        set_epsilon(&mut bd, "IsotropicDsl", 1e-12).unwrap();
        set_iter_max(&mut bd, "IsotropicDsl", 20).unwrap();
        let data = bd.data(h);
        assert_eq!(data.parameter_default("theta"), Some(1.0));
        assert_eq!(data.parameter_default("epsilon"), Some(1e-12));
        assert_eq!(data.parameter_default("iterMax"), Some(20.0));
    }

    #[test]
    fn newton_parameters_capture_errors() {
        let mut bd = new_sample_description("Norton");
        add_newton_parameters(&mut bd, 0.5).unwrap();
        assert_eq!(
            set_theta(&mut bd, "IsotropicDsl", 1.5).err(),
            Some(GenError::Runtime(
                "IsotropicDsl::treatTheta: theta value must be positive and smaller than 1".to_string()
            ))
        );
        assert_eq!(
            set_epsilon(&mut bd, "IsotropicDsl", -1.0).err(),
            Some(GenError::Runtime("IsotropicDsl::treatEpsilon: epsilon value must be positive".to_string()))
        );
        assert_eq!(
            set_iter_max(&mut bd, "IsotropicDsl", 0).err(),
            Some(GenError::Runtime(
                "IsotropicDsl::treatIterMax: invalid value for parameter 'iterMax'".to_string()
            ))
        );
        assert_eq!(
            add_newton_parameters(&mut bd, 0.5).err(),
            Some(GenError::NameAlreadyRegistered("theta".to_string()))
        );
    }

    #[test]
    fn check_hypotheses_captures_errors() {
        let supported = [ModellingHypothesis::PlaneStrain, ModellingHypothesis::Tridimensional];
        assert_eq!(check_hypotheses("IsotropicDsl", &supported, &[ModellingHypothesis::PlaneStrain]), Ok(()));
        assert_eq!(
            check_hypotheses("IsotropicDsl", &supported, &[ModellingHypothesis::PlaneStress]).err(),
            Some(GenError::Runtime(
                "IsotropicDsl::setModellingHypotheses: unsupported modelling hypothesis 'PlaneStress'".to_string()
            ))
        );
    }
}
