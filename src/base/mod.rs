//! Implements the base structures describing a behaviour

mod behaviour_data;
mod behaviour_description;
mod code_block;
mod config;
mod constants;
mod enums;
mod errors;
mod hypothesis;
mod parameters;
mod supported_types;
mod testing;
mod variable;
pub use crate::base::behaviour_data::*;
pub use crate::base::behaviour_description::*;
pub use crate::base::code_block::*;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::enums::*;
pub use crate::base::errors::*;
pub use crate::base::hypothesis::*;
pub use crate::base::parameters::*;
pub use crate::base::supported_types::*;
pub use crate::base::variable::*;

#[allow(unused_imports)]
pub(crate) use crate::base::testing::*;
