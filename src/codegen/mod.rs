//! Implements the generation of the C++ classes of a behaviour
//!
//! The generic part ([BehaviourCodeGenerator]) writes the data classes, the
//! behaviour class and the traits; the local integration algorithm is plugged
//! in through the emission hooks of a [LocalSolveStrategy].

mod ast;
mod generator;
mod identifiers;
mod implicit;
mod implicit_system;
mod isotropic;
mod mises_flows;
mod multiple_flows;
mod strategies;
mod traits;
pub use crate::codegen::ast::*;
pub use crate::codegen::generator::*;
pub use crate::codegen::identifiers::*;
pub use crate::codegen::implicit_system::*;
pub use crate::codegen::strategies::*;
pub use crate::codegen::traits::*;
