//! Implements symmetric tensor views over caller-owned buffers and a few tensor operations

mod operations;
mod sizes;
mod views;
pub use crate::tensor::operations::*;
pub use crate::tensor::sizes::*;
pub use crate::tensor::views::*;
