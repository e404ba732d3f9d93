use crate::quantity::Dimension;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Expected a {expected} quantity but got {found}")]
    DimensionMismatch {
        expected: &'static str,
        found: Dimension,
    },

    #[error("Could not parse quantity from '{input}'")]
    Parse { input: String },

    #[error("Unknown unit '{unit}'")]
    UnknownUnit { unit: String },
}
