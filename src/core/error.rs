use crate::core::estimators::TargetMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EbstError {
    #[error("feature value must be finite, got {0}")]
    NonFiniteKey(f64),

    #[error("weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),

    #[error("target values must be finite, got {0}")]
    NonFiniteTarget(f64),

    #[error("multivariate target has no outputs")]
    EmptyTarget,

    #[error("expected a {expected} target, got a {found} one")]
    ModeMismatch {
        expected: TargetMode,
        found: TargetMode,
    },

    #[error("cannot revert weight {requested}: only {available} accumulated")]
    RevertUnderflow { available: f64, requested: f64 },

    #[error("pruning budget must be positive, got {0}")]
    InvalidBudget(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}
