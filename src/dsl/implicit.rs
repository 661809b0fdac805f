use super::{add_newton_parameters, check_hypotheses, member_code, set_epsilon, set_iter_max, set_theta, Behaviour};
use crate::base::{throw_runtime_error, BehaviourDescription, Bounds, CodeBlockSlot, GenError, Mode, ModellingHypothesis};
use crate::base::{Position, VariableCategory, VariableDescription, ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN};
use crate::base::{DEFAULT_EPSILON, DEFAULT_THETA};
use crate::bricks::{DataMap, ElastoViscoPlasticityBrick};
use crate::codegen::{ImplicitScheme, LocalSolveStrategy, NonLinearSystemSolver};
use log::debug;

/// Names used by the members and the local variables of the implicit scheme
const RESERVED_NAMES: [&str; 21] = [
    "maximum_increment_value_per_iteration",
    "vect_e",
    "zeros",
    "tzeros",
    "zeros_1",
    "fzeros",
    "jacobian",
    "njacobian",
    "partial_jacobian",
    "t",
    "error_1",
    "error_p",
    "idx",
    "idx2",
    "idx3",
    "TinyMatrixSolve",
    "computeFdF",
    "solveNonLinearSystem",
    "getPartialJacobianInvert",
    "computeNumericalJacobian",
    "updateIntegrationVariables",
];

/// Code blocks that can't be given to the implicit DSL
const FORBIDDEN_SLOTS: [CodeBlockSlot; 1] = [CodeBlockSlot::FlowRule];

/// Describes a behaviour integrated by a Newton-Raphson algorithm over all its state variables
///
/// The state variables are the unknowns of the implicit system. Their
/// residuals (`f<name>`) and, with an analytical jacobian, the derivatives
/// `df<a>_dd<b>` are computed in the `Integrator` code block or contributed
/// by a brick.
#[derive(Clone, Debug)]
pub struct ImplicitDsl {
    bd: BehaviourDescription,
    solver: NonLinearSystemSolver,
    brick: Option<ElastoViscoPlasticityBrick>,
    blocks: Vec<(CodeBlockSlot, String)>,
}

impl ImplicitDsl {
    /// Returns the name of the DSL
    pub fn dsl_name() -> &'static str {
        "Implicit"
    }

    /// Allocates a new instance with the parameters of the Newton-Raphson algorithm
    pub fn new(name: &str) -> Result<Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        let mut bd = BehaviourDescription::new(name)?;
        for name in RESERVED_NAMES {
            bd.reserve_name(h, name)?;
        }
        add_newton_parameters(&mut bd, DEFAULT_THETA)?;
        let v = VariableDescription::new("real", "numerical_jacobian_epsilon")?.with_bounds(Bounds::lower(0.0));
        bd.add_parameter(h, v, DEFAULT_EPSILON / 10.0)?;
        Ok(ImplicitDsl {
            bd,
            solver: NonLinearSystemSolver::NewtonRaphson,
            brick: None,
            blocks: Vec::new(),
        })
    }

    /// Returns the description being built
    pub fn description(&self) -> &BehaviourDescription {
        &self.bd
    }

    /// Returns the solver of the implicit system
    pub fn algorithm(&self) -> NonLinearSystemSolver {
        self.solver
    }

    pub fn set_material_name(&mut self, material: &str) -> Result<&mut Self, GenError> {
        self.bd.set_material_name(material)?;
        Ok(self)
    }

    pub fn set_library(&mut self, library: &str) -> Result<&mut Self, GenError> {
        self.bd.set_library(library)?;
        Ok(self)
    }

    pub fn set_modelling_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<&mut Self, GenError> {
        check_hypotheses(Self::dsl_name(), &ModellingHypothesis::ALL, hypotheses)?;
        self.bd.set_modelling_hypotheses(hypotheses)?;
        Ok(self)
    }

    /// Selects the solver of the implicit system
    pub fn set_algorithm(&mut self, solver: NonLinearSystemSolver) -> Result<&mut Self, GenError> {
        if let NonLinearSystemSolver::NewtonRaphsonNumericalJacobian {
            jacobian_update_period: Some(0),
        } = solver
        {
            return Err(throw_runtime_error(
                "ImplicitDSL::treatAlgorithm",
                "the jacobian update period must be strictly positive",
            ));
        }
        self.solver = solver;
        Ok(self)
    }

    pub fn set_theta(&mut self, value: f64) -> Result<&mut Self, GenError> {
        set_theta(&mut self.bd, Self::dsl_name(), value)?;
        Ok(self)
    }

    /// Sets the convergence criterion; the perturbation of the numerical jacobian follows as `epsilon/10`
    pub fn set_epsilon(&mut self, value: f64) -> Result<&mut Self, GenError> {
        set_epsilon(&mut self.bd, Self::dsl_name(), value)?;
        self.bd
            .set_parameter_default(ModellingHypothesis::Undefined, "numerical_jacobian_epsilon", value / 10.0)?;
        Ok(self)
    }

    /// Sets the perturbation used to compute the numerical jacobian
    pub fn set_perturbation_value_for_numerical_jacobian(&mut self, value: f64) -> Result<&mut Self, GenError> {
        if !(value > 0.0) {
            return Err(throw_runtime_error(
                "ImplicitDSL::treatPerturbationValueForNumericalJacobianComputation",
                "perturbation value must be strictly positive",
            ));
        }
        self.bd
            .set_parameter_default(ModellingHypothesis::Undefined, "numerical_jacobian_epsilon", value)?;
        Ok(self)
    }

    pub fn set_iter_max(&mut self, value: usize) -> Result<&mut Self, GenError> {
        set_iter_max(&mut self.bd, Self::dsl_name(), value)?;
        Ok(self)
    }

    /// Adds a variable (state variables become unknowns of the implicit system)
    pub fn add_variable(&mut self, category: VariableCategory, variable: VariableDescription) -> Result<&mut Self, GenError> {
        self.bd.add_variable(ModellingHypothesis::Undefined, category, variable)?;
        Ok(self)
    }

    /// Adds a parameter with its default value
    pub fn add_parameter(&mut self, variable: VariableDescription, default: f64) -> Result<&mut Self, GenError> {
        self.bd.add_parameter(ModellingHypothesis::Undefined, variable, default)?;
        Ok(self)
    }

    /// Declares the elastic material properties (two for isotropic elasticity)
    pub fn set_elastic_material_properties(&mut self, names: &[&str]) -> Result<&mut Self, GenError> {
        self.bd.set_elastic_material_properties(names)?;
        Ok(self)
    }

    /// Compares the analytical jacobian to a numerical one at each iteration
    ///
    /// Differences greater than the parameter `jacobianComparisonCriterion`
    /// (`epsilon` by default) are printed.
    pub fn set_compare_to_numerical_jacobian(&mut self, flag: bool) -> Result<&mut Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        if flag && !self.bd.data(h).is_name_used("jacobianComparisonCriterion") {
            let epsilon = self.bd.data(h).parameter_default("epsilon").unwrap_or(DEFAULT_EPSILON);
            let v = VariableDescription::new("real", "jacobianComparisonCriterion")?.with_bounds(Bounds::lower(0.0));
            self.bd.add_parameter(h, v, epsilon)?;
        }
        self.bd.set_attribute(h, ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN, flag)?;
        Ok(self)
    }

    /// Composes the behaviour from the standard elasto-viscoplasticity brick
    pub fn add_brick(&mut self, data: &DataMap) -> Result<&mut Self, GenError> {
        if self.brick.is_some() {
            return Err(throw_runtime_error(
                "ImplicitDSL::treatBrick",
                "the StandardElastoViscoPlasticity brick has already been declared",
            ));
        }
        let brick = ElastoViscoPlasticityBrick::new(data)?;
        debug!(
            "'{}': brick with {} inelastic flow(s)",
            self.bd.behaviour_name,
            brick.inelastic_flows.len()
        );
        brick.initialize(&mut self.bd)?;
        self.brick = Some(brick);
        Ok(self)
    }

    /// Adds user code to a slot (appended to the code of the brick, if any)
    pub fn add_code(&mut self, slot: CodeBlockSlot, code: &str) -> Result<&mut Self, GenError> {
        if FORBIDDEN_SLOTS.contains(&slot) {
            return Err(throw_runtime_error(
                "ImplicitDSL::addCode",
                &format!("the code block '{}' can't be defined by this DSL", slot.name()),
            ));
        }
        if slot == CodeBlockSlot::ComputeTangentOperator {
            self.bd.has_consistent_tangent_operator = true;
        }
        self.blocks.push((slot, code.to_string()));
        Ok(self)
    }

    /// Declares the consistent tangent operator as symmetric
    pub fn set_tangent_operator_symmetric(&mut self, flag: bool) -> Result<&mut Self, GenError> {
        self.bd.is_consistent_tangent_operator_symmetric = flag;
        Ok(self)
    }

    /// Completes the description
    pub fn finish(mut self) -> Result<Behaviour, GenError> {
        let h = ModellingHypothesis::Undefined;
        for (slot, code) in std::mem::take(&mut self.blocks) {
            let block = member_code(self.bd.data(h), &code, false, &[]);
            self.bd.set_code(h, slot, block, Mode::CreateOrAppend, Position::AtEnd)?;
        }
        let scheme = match &self.brick {
            Some(brick) => brick.implicit_scheme(self.solver)?,
            None => ImplicitScheme::new(self.solver, Vec::new()),
        };
        if scheme.terms.is_empty() && !self.bd.has_code(h, CodeBlockSlot::Integrator) {
            return Err(throw_runtime_error(
                "ImplicitDSL::endsInputFileProcessing",
                "no integrator code nor brick defined",
            ));
        }
        Ok(Behaviour {
            description: self.bd,
            strategy: LocalSolveStrategy::Implicit(scheme),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ImplicitDsl;
    use approx::assert_relative_eq;
    use crate::base::{CodeBlockSlot, GenError, GeneratorConfig, ModellingHypothesis, VariableCategory};
    use crate::base::{VariableDescription, ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN};
    use crate::bricks::{data_map, Data};
    use crate::codegen::{LocalSolveStrategy, NonLinearSystemSolver};

    fn norton() -> ImplicitDsl {
        let mut dsl = ImplicitDsl::new("ImplicitNorton").unwrap();
        let eel = VariableDescription::new("StrainStensor", "eel").unwrap();
        let p = VariableDescription::new("strain", "p").unwrap();
        dsl.add_variable(VariableCategory::StateVariable, eel)
            .unwrap()
            .add_variable(VariableCategory::StateVariable, p)
            .unwrap();
        for name in ["young", "nu", "A", "E"] {
            let v = VariableDescription::new("real", name).unwrap();
            dsl.add_variable(VariableCategory::MaterialProperty, v).unwrap();
        }
        dsl.set_elastic_material_properties(&["young", "nu"])
            .unwrap()
            .add_code(
                CodeBlockSlot::ComputeStress,
                "sig = computeLambda(young,nu)*trace(eel)*Stensor::Id()+2*computeMu(young,nu)*eel;",
            )
            .unwrap()
            .add_code(
                CodeBlockSlot::Integrator,
                "const auto seq = sigmaeq(sig);\nfeel += dp*1.5*deviator(sig)/seq-deto;\nfp -= A*pow(seq,E)*dt;",
            )
            .unwrap();
        dsl
    }

    #[test]
    fn new_works() {
        let h = ModellingHypothesis::Undefined;
        let dsl = ImplicitDsl::new("Implicit").unwrap();
        let data = dsl.description().data(h);
        assert_eq!(data.parameter_default("theta"), Some(0.5));
        assert_relative_eq!(data.parameter_default("numerical_jacobian_epsilon").unwrap(), 1e-9);
        assert!(data.is_name_used("fzeros"));
        assert_eq!(dsl.algorithm(), NonLinearSystemSolver::NewtonRaphson);
    }

    #[test]
    fn finish_works() {
        let h = ModellingHypothesis::Undefined;
        let mut dsl = norton();
        dsl.set_algorithm(NonLinearSystemSolver::NewtonRaphsonNumericalJacobian {
            jacobian_update_period: None,
        })
        .unwrap()
        .set_epsilon(1e-12)
        .unwrap();
        let behaviour = dsl.finish().unwrap();
        let params = behaviour.parameters();
        assert_relative_eq!(params.get("numerical_jacobian_epsilon").unwrap(), 1e-13);
        let integrator = behaviour.description.code(h, CodeBlockSlot::Integrator).unwrap();
        assert_eq!(
            integrator.code,
            "const auto seq = sigmaeq(this->sig);\nfeel += this->dp*1.5*deviator(this->sig)/seq-this->deto;\nfp -= this->A*pow(seq,this->E)*dt;"
        );
        match &behaviour.strategy {
            LocalSolveStrategy::Implicit(scheme) => assert!(scheme.terms.is_empty()),
            _ => panic!("wrong strategy"),
        }
        let mut config = GeneratorConfig::new();
        config.set_hypotheses(&[ModellingHypothesis::Tridimensional]).unwrap();
        let files = behaviour.generate(&config).unwrap();
        let code = files.get("TFEL/Material/ImplicitNorton.hxx").unwrap();
        assert!(code.contains("this->computeNumericalJacobian(this->jacobian);"));
    }

    #[test]
    fn brick_works() {
        let h = ModellingHypothesis::Undefined;
        let mut dsl = ImplicitDsl::new("Plasticity").unwrap();
        let flow = Data::Map(data_map([
            ("name", Data::from("Plastic")),
            ("criterion", Data::from("Mises")),
            (
                "isotropic_hardening",
                Data::Map(data_map([
                    ("name", Data::from("Linear")),
                    ("R0", Data::from(150e6)),
                    ("H", Data::from(1e9)),
                ])),
            ),
        ]));
        let brick = data_map([("stress_potential", Data::from("Hooke")), ("inelastic_flow", flow)]);
        dsl.add_brick(&brick).unwrap().set_compare_to_numerical_jacobian(true).unwrap();
        let data = dsl.description().data(h);
        assert!(data.has_variable(VariableCategory::StateVariable, "eel"));
        assert_eq!(data.parameter_default("jacobianComparisonCriterion"), Some(1e-8));
        assert!(data.attribute(ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN));
        assert_eq!(
            dsl.add_brick(&brick).err(),
            Some(GenError::Runtime(
                "ImplicitDSL::treatBrick: the StandardElastoViscoPlasticity brick has already been declared".to_string()
            ))
        );
        let behaviour = dsl.finish().unwrap();
        assert!(behaviour.description.has_consistent_tangent_operator);
        match &behaviour.strategy {
            LocalSolveStrategy::Implicit(scheme) => assert_eq!(scheme.terms[0].residual, "eel"),
            _ => panic!("wrong strategy"),
        }
    }

    #[test]
    fn dsl_captures_errors() {
        let mut dsl = ImplicitDsl::new("Implicit").unwrap();
        assert_eq!(
            dsl.add_code(CodeBlockSlot::FlowRule, "f = 0;").err(),
            Some(GenError::Runtime(
                "ImplicitDSL::addCode: the code block 'FlowRule' can't be defined by this DSL".to_string()
            ))
        );
        assert_eq!(
            dsl.set_algorithm(NonLinearSystemSolver::NewtonRaphsonNumericalJacobian {
                jacobian_update_period: Some(0)
            })
            .err(),
            Some(GenError::Runtime(
                "ImplicitDSL::treatAlgorithm: the jacobian update period must be strictly positive".to_string()
            ))
        );
        let v = VariableDescription::new("real", "zeros").unwrap();
        assert_eq!(
            dsl.add_variable(VariableCategory::StateVariable, v).err(),
            Some(GenError::ReservedName("zeros".to_string()))
        );
        assert_eq!(
            dsl.set_perturbation_value_for_numerical_jacobian(0.0).err(),
            Some(GenError::Runtime(
                "ImplicitDSL::treatPerturbationValueForNumericalJacobianComputation: perturbation value must be strictly positive"
                    .to_string()
            ))
        );
        assert_eq!(
            dsl.finish().err(),
            Some(GenError::Runtime(
                "ImplicitDSL::endsInputFileProcessing: no integrator code nor brick defined".to_string()
            ))
        );
    }
}
