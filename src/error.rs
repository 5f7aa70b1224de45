//! Error types for the anofox-ets library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while configuring, fitting or querying a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value, configuration or input shape.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Model has already been fitted and cannot be fitted again.
    #[error("model has already been fitted")]
    AlreadyFitted,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Model search finished without a single admissible candidate.
    #[error("no valid model found: {failed} of {evaluated} candidates failed")]
    NoValidModel { evaluated: usize, failed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 13, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 13, got 5"
        );

        let err = ForecastError::InvalidParameter("alpha must lie in (0, 1]".to_string());
        assert_eq!(
            err.to_string(),
            "invalid parameter: alpha must lie in (0, 1]"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");

        let err = ForecastError::NoValidModel {
            evaluated: 10,
            failed: 10,
        };
        assert_eq!(
            err.to_string(),
            "no valid model found: 10 of 10 candidates failed"
        );
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::AlreadyFitted;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
        assert_ne!(err1, ForecastError::FitRequired);
    }
}
