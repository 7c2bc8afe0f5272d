//! Application services layer.

pub mod compile;
pub mod error;
