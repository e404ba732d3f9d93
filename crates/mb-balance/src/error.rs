//! Error types for balancing.

use mb_core::CoreError;
use mb_mixture::MixError;
use thiserror::Error;

/// Errors that can occur while setting up or solving a mass balance.
///
/// An infeasible target is not an error; it is reported as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error("Mixture error: {0}")]
    Mixture(#[from] MixError),

    #[error("Quantity error: {0}")]
    Core(#[from] CoreError),

    #[error("Stock '{stock}' has no location")]
    MissingLocation { stock: String },

    #[error("Least-squares solve failed: {what}")]
    SolverFailure { what: String },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Serialization error: {what}")]
    Serialization { what: String },
}

pub type BalanceResult<T> = Result<T, BalanceError>;

impl From<serde_json::Error> for BalanceError {
    fn from(e: serde_json::Error) -> Self {
        BalanceError::Serialization {
            what: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BalanceError {
    fn from(e: serde_yaml::Error) -> Self {
        BalanceError::Serialization {
            what: e.to_string(),
        }
    }
}
