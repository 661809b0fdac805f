//! Wraps generated behaviours for finite element solvers
//!
//! The writers emit the Ansys and LS-DYNA entry points of a behaviour. The
//! remaining items reproduce what those entry points do at run time: the
//! contract checks on the solver arrays, the conversion of the symmetric
//! tensors and of the tangent operator, the stiffness tensor computed from
//! the material properties, and the mapping of failures to return codes.
//! [SolverInterface] chains them around a Rust [crate::integration::BehaviourKernel].

mod checks;
mod emulation;
mod errors;
mod hypotheses;
mod stiffness;
mod tangent;
mod writer;
pub use crate::interfaces::checks::*;
pub use crate::interfaces::emulation::*;
pub use crate::interfaces::errors::*;
pub use crate::interfaces::hypotheses::*;
pub use crate::interfaces::stiffness::*;
pub use crate::interfaces::tangent::*;
pub use crate::interfaces::writer::*;
