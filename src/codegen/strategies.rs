use super::{implicit, isotropic, mises_flows, multiple_flows, ImplicitSystem, ResidualTerm, SourceWriter, Stmt};
use crate::base::{throw_runtime_error, BehaviourDescription, BehaviourData, CodeBlockSlot, GenError};
use crate::base::{GeneratorConfig, ModellingHypothesis};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the kinds of isotropic flows
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum FlowKind {
    /// Yield surface `f(seq,p) = 0`
    PlasticFlow,

    /// Creep `dp/dt = f(seq)`
    CreepFlow,

    /// Strain hardening creep `dp/dt = f(seq,p)`
    StrainHardeningCreepFlow,
}

impl FlowKind {
    /// Returns the keyword of the flow
    pub fn name(&self) -> &'static str {
        match self {
            FlowKind::PlasticFlow => "Plasticity",
            FlowKind::CreepFlow => "Creep",
            FlowKind::StrainHardeningCreepFlow => "StrainHardeningCreep",
        }
    }

    /// Finds a flow by its keyword
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        match name {
            "Plasticity" => Ok(FlowKind::PlasticFlow),
            "Creep" => Ok(FlowKind::CreepFlow),
            "StrainHardeningCreep" => Ok(FlowKind::StrainHardeningCreepFlow),
            _ => Err("unknown flow rule: valid flow rules are 'Plasticity', 'Creep' and 'StrainHardeningCreep'"),
        }
    }

    /// Indicates that the flow depends on the equivalent strain
    pub fn depends_on_p(&self) -> bool {
        !matches!(self, FlowKind::CreepFlow)
    }
}

/// Describes one flow of a behaviour combining several isotropic flows
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FlowDescription {
    /// Kind of flow
    pub kind: FlowKind,

    /// Flow rule computing `f<i>`, `df_dseq<i>` (and `df_dp<i>`)
    pub code: String,

    /// Specific value of the implicit parameter, if any
    pub theta: Option<f64>,
}

/// Defines the solvers of the implicit system
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum NonLinearSystemSolver {
    /// Newton-Raphson with a user-provided jacobian
    NewtonRaphson,

    /// Newton-Raphson with a jacobian computed by central differences
    ///
    /// The jacobian is recomputed every `jacobian_update_period` iterations (every iteration if None).
    NewtonRaphsonNumericalJacobian { jacobian_update_period: Option<usize> },
}

impl NonLinearSystemSolver {
    /// Returns the name of the solver
    pub fn name(&self) -> &'static str {
        match self {
            NonLinearSystemSolver::NewtonRaphson => "NewtonRaphson",
            NonLinearSystemSolver::NewtonRaphsonNumericalJacobian { .. } => "NewtonRaphson_NumericalJacobian",
        }
    }

    /// Finds a solver by its name
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        match name {
            "NewtonRaphson" => Ok(NonLinearSystemSolver::NewtonRaphson),
            "NewtonRaphson_NumericalJacobian" => Ok(NonLinearSystemSolver::NewtonRaphsonNumericalJacobian {
                jacobian_update_period: None,
            }),
            _ => Err("unknown non linear system solver"),
        }
    }

    /// Indicates that the jacobian is computed numerically
    pub fn requires_numerical_jacobian(&self) -> bool {
        matches!(self, NonLinearSystemSolver::NewtonRaphsonNumericalJacobian { .. })
    }
}

/// Holds the setup of the implicit scheme
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitScheme {
    /// Solver of the implicit system
    pub solver: NonLinearSystemSolver,

    /// Contributions to the residuals, in registration order
    pub terms: Vec<ResidualTerm>,

    /// Staggered treatment of the porosity, if any
    pub staggered: Option<StaggeredPorosityScheme>,
}

impl ImplicitScheme {
    /// Allocates a new instance solving the full system at once
    pub fn new(solver: NonLinearSystemSolver, terms: Vec<ResidualTerm>) -> Self {
        ImplicitScheme {
            solver,
            terms,
            staggered: None,
        }
    }
}

/// Defines how successive estimates of the porosity increment are combined
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum StaggeredAcceleration {
    /// `df += factor * (next - current)`
    Relaxation(f64),

    /// Aitken's dynamic relaxation
    Aitken,
}

/// Holds the setup of the fixed-point iterations on the porosity increment
///
/// The implicit system is solved with a frozen porosity increment until two
/// successive estimates are close enough; the full system is then solved
/// once more to obtain the jacobian used by the tangent operator.
#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredPorosityScheme {
    /// Name of the porosity unknown
    pub porosity: String,

    /// Acceleration of the fixed-point iterations
    pub acceleration: StaggeredAcceleration,
}

/// Defines the local integration algorithm of a behaviour
///
/// Each variant selects one set of emission hooks; the generic generator
/// calls the hooks at fixed places of the behaviour class.
#[derive(Clone, Debug, PartialEq)]
pub enum LocalSolveStrategy {
    /// Scalar Newton on `dp - f(seq)*dt`
    IsotropicMisesCreep,

    /// Scalar Newton on the yield surface with an active/inactive switch
    IsotropicMisesPlasticFlow,

    /// Scalar Newton on `dp - f(seq,p)*dt`
    IsotropicStrainHardeningMisesCreep,

    /// Vector Newton over the plastic increments of each flow
    MultipleIsotropicMisesFlows(Vec<FlowDescription>),

    /// Newton-Raphson over all the unknowns of an implicit system
    Implicit(ImplicitScheme),
}

/// Defines the signature of an emission hook
pub type Emitter = fn(&EmitContext, &mut SourceWriter) -> Result<(), GenError>;

/// Holds the emission hooks of a strategy
#[derive(Clone, Copy)]
pub struct EmissionHooks {
    /// Writes code at the end of `initialize()`
    pub initialize: Emitter,

    /// Writes the strategy-specific members (fields and methods)
    pub members: Emitter,

    /// Writes the body of `integrate()` (after the tangent operator flag check)
    pub integrator: Emitter,

    /// Writes the body of `computeConsistentTangentOperator()`
    pub tangent_operator: Emitter,

    /// Writes the body of `computePredictionOperator()` when no code block is given
    pub prediction_operator: Emitter,
}

/// Holds what an emission hook needs to know
pub struct EmitContext<'a> {
    /// Behaviour being generated
    pub bd: &'a BehaviourDescription,

    /// Hypothesis of the class being written (Undefined for the generic class)
    pub hypothesis: ModellingHypothesis,

    /// Configuration
    pub config: &'a GeneratorConfig,

    /// Local integration algorithm
    pub strategy: &'a LocalSolveStrategy,
}

impl<'a> EmitContext<'a> {
    /// Returns the data of the class being written
    pub fn data(&self) -> &'a BehaviourData {
        self.bd.data(self.hypothesis)
    }

    /// Returns the name of the generated class
    pub fn class_name(&self) -> String {
        self.bd.class_name()
    }

    /// Returns the code of a slot, if any
    pub fn code(&self, slot: CodeBlockSlot) -> Option<&'a str> {
        self.data().code(slot).map(|c| c.code.as_str())
    }

    /// Returns the names of Young's modulus and Poisson's ratio
    pub fn elastic_names(&self) -> Result<(&'a str, &'a str), GenError> {
        match self.bd.elastic_material_properties() {
            [young, nu] => Ok((young.as_str(), nu.as_str())),
            list => Err(GenError::InvalidElasticPropertiesCount(list.len())),
        }
    }

    /// Returns a trace statement if the debug mode is on
    pub fn trace(&self, method: &str, message: &str) -> Option<Stmt> {
        if self.config.debug_mode {
            Some(Stmt::Raw(format!(
                "std::cout << \"{}::{}: \" << {} << '\\n';",
                self.class_name(),
                method,
                message
            )))
        } else {
            None
        }
    }

    /// Writes a trace statement if the debug mode is on
    pub fn debug(&self, w: &mut SourceWriter, method: &str, message: &str) -> Result<(), GenError> {
        if let Some(stmt) = self.trace(method, message) {
            w.emit(&stmt)?;
        }
        Ok(())
    }
}

fn write_nothing(_: &EmitContext, _: &mut SourceWriter) -> Result<(), GenError> {
    Ok(())
}

impl LocalSolveStrategy {
    /// Returns the name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            LocalSolveStrategy::IsotropicMisesCreep => "IsotropicMisesCreep",
            LocalSolveStrategy::IsotropicMisesPlasticFlow => "IsotropicMisesPlasticFlow",
            LocalSolveStrategy::IsotropicStrainHardeningMisesCreep => "IsotropicStrainHardeningMisesCreep",
            LocalSolveStrategy::MultipleIsotropicMisesFlows(_) => "MultipleIsotropicMisesFlows",
            LocalSolveStrategy::Implicit(_) => "Implicit",
        }
    }

    /// Indicates that the strategy relies on isotropic elasticity given by Lamé coefficients
    pub fn is_isotropic(&self) -> bool {
        !matches!(self, LocalSolveStrategy::Implicit(_))
    }

    /// Returns the emission hooks
    pub fn hooks(&self) -> EmissionHooks {
        match self {
            LocalSolveStrategy::IsotropicMisesCreep => EmissionHooks {
                initialize: mises_flows::write_creep_initialize,
                members: mises_flows::write_creep_members,
                integrator: mises_flows::write_creep_integrator,
                tangent_operator: mises_flows::write_creep_tangent_operator,
                prediction_operator: isotropic::write_elastic_prediction_operator,
            },
            LocalSolveStrategy::IsotropicMisesPlasticFlow => EmissionHooks {
                initialize: write_nothing,
                members: mises_flows::write_plastic_members,
                integrator: mises_flows::write_plastic_integrator,
                tangent_operator: mises_flows::write_plastic_tangent_operator,
                prediction_operator: isotropic::write_elastic_prediction_operator,
            },
            LocalSolveStrategy::IsotropicStrainHardeningMisesCreep => EmissionHooks {
                initialize: write_nothing,
                members: mises_flows::write_strain_hardening_creep_members,
                integrator: mises_flows::write_strain_hardening_creep_integrator,
                tangent_operator: mises_flows::write_strain_hardening_creep_tangent_operator,
                prediction_operator: isotropic::write_elastic_prediction_operator,
            },
            LocalSolveStrategy::MultipleIsotropicMisesFlows(_) => EmissionHooks {
                initialize: write_nothing,
                members: multiple_flows::write_members,
                integrator: multiple_flows::write_integrator,
                tangent_operator: multiple_flows::write_tangent_operator,
                prediction_operator: isotropic::write_elastic_prediction_operator,
            },
            LocalSolveStrategy::Implicit(_) => EmissionHooks {
                initialize: write_nothing,
                members: implicit::write_members,
                integrator: implicit::write_integrator,
                tangent_operator: implicit::write_tangent_operator,
                prediction_operator: implicit::write_prediction_operator,
            },
        }
    }

    /// Returns the strategy-specific includes
    pub fn includes(&self) -> &'static [&'static str] {
        match self {
            LocalSolveStrategy::MultipleIsotropicMisesFlows(_) => &[
                "TFEL/Math/General/BaseCast.hxx",
                "TFEL/Math/TinyMatrixSolve.hxx",
                "TFEL/Material/Lame.hxx",
            ],
            LocalSolveStrategy::Implicit(_) => &[
                "TFEL/Math/tvector.hxx",
                "TFEL/Math/tmatrix.hxx",
                "TFEL/Math/TinyMatrixSolve.hxx",
                "TFEL/Math/Vector/TinyVectorFromTinyVectorView.hxx",
                "TFEL/Material/Lame.hxx",
            ],
            _ => &["TFEL/Material/Lame.hxx"],
        }
    }

    /// Indicates that the behaviour provides a prediction operator
    pub fn has_prediction_operator(&self, data: &BehaviourData) -> bool {
        self.is_isotropic() || data.has_code(CodeBlockSlot::ComputePredictionOperator)
    }

    /// Checks the preconditions of the strategy for the given hypotheses
    pub fn check(&self, bd: &BehaviourDescription, hypotheses: &[ModellingHypothesis]) -> Result<(), GenError> {
        if self.is_isotropic() {
            isotropic::check_isotropic_elasticity(bd)?;
        }
        for h in hypotheses {
            match self {
                LocalSolveStrategy::IsotropicMisesCreep
                | LocalSolveStrategy::IsotropicMisesPlasticFlow
                | LocalSolveStrategy::IsotropicStrainHardeningMisesCreep => {
                    bd.code(*h, CodeBlockSlot::FlowRule)?;
                }
                LocalSolveStrategy::MultipleIsotropicMisesFlows(flows) => {
                    if flows.is_empty() {
                        return Err(throw_runtime_error(
                            "MultipleIsotropicMisesFlows::check",
                            "no flow rule defined",
                        ));
                    }
                }
                LocalSolveStrategy::Implicit(scheme) => {
                    let system = ImplicitSystem::new(bd.data(*h))?;
                    let analytical = !scheme.solver.requires_numerical_jacobian();
                    system.check_terms(&scheme.terms, analytical)?;
                    if scheme.terms.is_empty() && !bd.has_code(*h, CodeBlockSlot::Integrator) {
                        bd.code(*h, CodeBlockSlot::Integrator)?;
                    }
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FlowDescription, FlowKind, ImplicitScheme, LocalSolveStrategy, NonLinearSystemSolver};
    use crate::base::{new_sample_description, CodeBlock, CodeBlockSlot, GenError, Mode, ModellingHypothesis, Position};
    use crate::codegen::ResidualTerm;

    #[test]
    fn names_work() {
        assert_eq!(FlowKind::from_name("Creep"), Ok(FlowKind::CreepFlow));
        assert_eq!(FlowKind::StrainHardeningCreepFlow.name(), "StrainHardeningCreep");
        assert!(FlowKind::PlasticFlow.depends_on_p());
        assert!(!FlowKind::CreepFlow.depends_on_p());
        assert_eq!(
            FlowKind::from_name("Viscous").err(),
            Some("unknown flow rule: valid flow rules are 'Plasticity', 'Creep' and 'StrainHardeningCreep'")
        );
        let solver = NonLinearSystemSolver::from_name("NewtonRaphson_NumericalJacobian").unwrap();
        assert!(solver.requires_numerical_jacobian());
        assert_eq!(solver.name(), "NewtonRaphson_NumericalJacobian");
        assert_eq!(
            NonLinearSystemSolver::from_name("Broyden").err(),
            Some("unknown non linear system solver")
        );
        assert_eq!(LocalSolveStrategy::IsotropicMisesCreep.name(), "IsotropicMisesCreep");
    }

    #[test]
    fn check_captures_errors() {
        let h = ModellingHypothesis::Tridimensional;
        let mut bd = new_sample_description("Norton");
        let creep = LocalSolveStrategy::IsotropicMisesCreep;
        assert_eq!(
            creep.check(&bd, &[h]).err(),
            Some(GenError::MissingCodeBlock {
                slot: "FlowRule".to_string(),
                hypothesis: "Tridimensional".to_string()
            })
        );
        let block = CodeBlock::new("this->f = 0;");
        bd.set_code(
            ModellingHypothesis::Undefined,
            CodeBlockSlot::FlowRule,
            block,
            Mode::Create,
            Position::AtEnd,
        )
        .unwrap();
        assert_eq!(creep.check(&bd, &[h]), Ok(()));

        let multi = LocalSolveStrategy::MultipleIsotropicMisesFlows(Vec::new());
        assert_eq!(
            multi.check(&bd, &[h]).err(),
            Some(GenError::Runtime(
                "MultipleIsotropicMisesFlows::check: no flow rule defined".to_string()
            ))
        );
        let multi = LocalSolveStrategy::MultipleIsotropicMisesFlows(vec![FlowDescription {
            kind: FlowKind::CreepFlow,
            code: String::new(),
            theta: None,
        }]);
        assert_eq!(multi.check(&bd, &[h]), Ok(()));

        let implicit = LocalSolveStrategy::Implicit(ImplicitScheme::new(
            NonLinearSystemSolver::NewtonRaphson,
            vec![ResidualTerm::new("p", "fp -= 1;").with_dependency("p")],
        ));
        assert_eq!(
            implicit.check(&bd, &[h]).err(),
            Some(GenError::MissingDerivativeTerm {
                residual: "p".to_string(),
                unknown: "p".to_string()
            })
        );
    }
}
