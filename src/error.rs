//! Error types shared across the crate
//!
//! Configuration problems are caught at construction time and reported as
//! [`ConfigError`]. Runtime failures of the consumer are [`PipelineError`].

use thiserror::Error;

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, received {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("{field} must be positive, received {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Reject values outside `[min, max]`, including NaN
    pub fn check_range(
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
        expected: &'static str,
    ) -> Result<(), Self> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                expected,
            })
        }
    }

    /// Reject zero, negative and NaN values
    pub fn check_positive(field: &'static str, value: f64) -> Result<(), Self> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(Self::NonPositive { field, value })
        }
    }

    /// Reject negative and NaN values
    pub fn check_non_negative(field: &'static str, value: f64) -> Result<(), Self> {
        Self::check_range(field, value, 0.0, f64::INFINITY, "non-negative")
    }
}

/// The queue refused a document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("queue is closed")]
    Closed,
}

/// Failures raised while running the consumer pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid consumer transition from {from} to {to}")]
    InvalidState {
        from: &'static str,
        to: &'static str,
    },

    #[error("document {id} could not be vectorized: {reason}")]
    Vectorize { id: String, reason: String },

    #[error("development receiver was dropped")]
    Sink,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(ConfigError::check_range("threshold", f64::NAN, 0.0, 1.0, "in [0, 1]").is_err());
        assert!(ConfigError::check_range("threshold", 0.5, 0.0, 1.0, "in [0, 1]").is_ok());
        assert!(ConfigError::check_range("threshold", 1.0, 0.0, 1.0, "in [0, 1]").is_ok());
    }

    #[test]
    fn test_check_positive() {
        assert!(ConfigError::check_positive("period", 0.0).is_err());
        assert!(ConfigError::check_positive("period", -1.0).is_err());
        assert!(ConfigError::check_positive("period", 3.0).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::OutOfRange {
            field: "clustering.threshold",
            value: 1.5,
            expected: "in [0, 1]",
        };
        assert_eq!(
            err.to_string(),
            "clustering.threshold must be in [0, 1], received 1.5"
        );

        let err = PipelineError::InvalidState {
            from: "stopped",
            to: "running",
        };
        assert!(err.to_string().contains("stopped"));
    }
}
