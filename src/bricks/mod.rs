//! Implements the behaviour bricks
//!
//! A brick contributes variables, code blocks and residual terms to an
//! implicit scheme. Bricks are closed enums matched on their kind; members
//! of several instances are told apart by the flow id (`fid`) and the
//! hardening or nucleation id appended to their names.

mod data;
mod elasto_viscoplasticity;
mod inelastic_flow;
mod isotropic_hardening;
mod kinematic_hardening;
mod material_property;
mod option_description;
mod porosity;
mod stress_criterion;
mod stress_potential;
mod utilities;
pub use crate::bricks::data::*;
pub use crate::bricks::elasto_viscoplasticity::*;
pub use crate::bricks::inelastic_flow::*;
pub use crate::bricks::isotropic_hardening::*;
pub use crate::bricks::kinematic_hardening::*;
pub use crate::bricks::material_property::*;
pub use crate::bricks::option_description::*;
pub use crate::bricks::porosity::*;
pub use crate::bricks::stress_criterion::*;
pub use crate::bricks::stress_potential::*;
pub use crate::bricks::utilities::*;
