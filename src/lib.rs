//! Generates integration code for mechanical behaviours
//!
//! A behaviour is described by a [base::BehaviourDescription] (usually built by one of
//! the front-ends in [dsl]). The generators in [codegen] turn the description into
//! four C++ files per behaviour, the adapters in [interfaces] wrap the result for
//! solvers such as Ansys and LS-DYNA, and [integration] holds reference kernels
//! reproducing the local-solve algorithms emitted by the generators.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod bricks;
pub mod codegen;
pub mod dsl;
pub mod integration;
pub mod interfaces;
pub mod prelude;
pub mod tensor;
