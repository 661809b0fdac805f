//! Makes available common structures needed to generate a behaviour
//!
//! You may write `use mbgen::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{BehaviourDescription, BehaviourParameters, GenError, GeneratorConfig, ModellingHypothesis};
pub use crate::base::{CodeBlock, CodeBlockSlot, Mode, Position, VariableCategory, VariableDescription};
pub use crate::base::{BehaviourSymmetry, OrthotropicAxesConvention, Solver, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::bricks::{Data, DataMap, MaterialProperty};
pub use crate::codegen::{BehaviourCodeGenerator, GeneratedFiles, LocalSolveStrategy, NonLinearSystemSolver};
pub use crate::dsl::{Behaviour, BehaviourFile, ImplicitDsl, IsotropicDsl, IsotropicFlowKind, MultipleIsotropicMisesFlowsDsl};
pub use crate::interfaces::{InterfaceError, SolverInterface};
pub use crate::StrError;
