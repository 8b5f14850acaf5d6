//! Checks that run over finished pages.

pub mod parameters;

pub use parameters::{validate_parameters, ParameterValidation};
