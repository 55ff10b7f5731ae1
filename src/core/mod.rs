pub mod error;
pub mod estimators;
