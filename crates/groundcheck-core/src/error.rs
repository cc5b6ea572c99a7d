//! Error types for groundcheck-core.
//!
//! Only missing or invalid input identity is fatal to a validation run.
//! Insufficient statistical data is not an error at all (see
//! [`crate::stats::Section`]), and computation errors are absorbed by the
//! section that raised them.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised by storage collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Session or recording not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Backend failure (database, filesystem, network)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by pass/fail criteria evaluators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CriteriaError {
    /// Criteria contain out-of-range thresholds
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),
    /// Evaluator failed to produce a verdict
    #[error("Criteria evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Arithmetic or lookup failures inside statistical routines.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatsError {
    /// Probability outside the open interval (0, 1)
    #[error("Probability {0} is outside (0, 1)")]
    InvalidProbability(f64),
    /// Degrees of freedom must be positive and finite
    #[error("Invalid degrees of freedom: {0}")]
    InvalidDegreesOfFreedom(f64),
    /// Quantile search failed to bracket or converge
    #[error("Quantile search did not converge")]
    QuantileDidNotConverge,
}

/// Errors that abort a validation run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Referenced session or recording is absent
    #[error("Not found: {0}")]
    NotFound(String),
    /// Storage collaborator failed
    #[error("Storage error: {0}")]
    Store(StoreError),
    /// Criteria collaborator failed
    #[error("Criteria error: {0}")]
    Criteria(#[from] CriteriaError),
    /// Caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Workflow configuration is out of range
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<StoreError> for ValidationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ValidationError::NotFound(what),
            other => ValidationError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_validation_not_found() {
        let err: ValidationError = StoreError::NotFound("session s1".to_string()).into();
        assert_eq!(err, ValidationError::NotFound("session s1".to_string()));
        assert_eq!(err.to_string(), "Not found: session s1");
    }

    #[test]
    fn test_backend_error_is_wrapped() {
        let err: ValidationError = StoreError::Backend("timeout".to_string()).into();
        assert!(matches!(err, ValidationError::Store(StoreError::Backend(_))));
    }
}
