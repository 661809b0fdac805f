//! Implements reference kernels of the local integration algorithms
//!
//! The kernels follow step by step the algorithms written by the code
//! generators (elastic prediction, Newton iterations, fallbacks and tangent
//! operators), so that the generated behaviours can be checked against them
//! and the solver interfaces can be emulated without a C++ compiler.

mod flow_rules;
mod kernel;
mod local_state;
mod mises;
mod multiple_flows;
mod newton_raphson;
mod porosity;
mod settings;
pub use crate::integration::flow_rules::*;
pub use crate::integration::kernel::*;
pub use crate::integration::local_state::*;
pub use crate::integration::mises::*;
pub use crate::integration::multiple_flows::*;
pub use crate::integration::newton_raphson::*;
pub use crate::integration::porosity::*;
pub use crate::integration::settings::*;
