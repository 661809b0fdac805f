//! Implements the front-ends building behaviour descriptions
//!
//! Each DSL declares the variables and the reserved names its local
//! integration algorithm relies on, rewrites the user code so that members
//! are accessed through `this`, and returns a [Behaviour] pairing the
//! description with its [crate::codegen::LocalSolveStrategy].

mod behaviour_file;
mod common;
mod implicit;
mod isotropic;
mod isotropic_base;
mod multiple_flows;
pub use crate::dsl::behaviour_file::*;
pub use crate::dsl::common::*;
pub use crate::dsl::implicit::*;
pub use crate::dsl::isotropic::*;
pub(crate) use crate::dsl::isotropic_base::*;
pub use crate::dsl::multiple_flows::*;
