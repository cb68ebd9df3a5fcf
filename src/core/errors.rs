use thiserror::Error;

/// Unified error type for the coordinator
///
/// `Cancelled` doubles as the signal caller-supplied work raises to report
/// that it stopped early because its token fired; the coordinator downcasts
/// work failures to this type to tell cancellation apart from real errors.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Request was cancelled before completing
    #[error("Request was cancelled: {key}")]
    Cancelled {
        key: String,
        reason: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

impl CoordinatorError {
    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(key: S) -> Self {
        Self::Cancelled {
            key: key.into(),
            reason: None,
        }
    }

    /// Create a cancellation error with a reason
    pub fn cancelled_with_reason<S: Into<String>, R: Into<String>>(key: S, reason: R) -> Self {
        Self::Cancelled {
            key: key.into(),
            reason: Some(reason.into()),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error with the offending field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Check whether this error represents cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Cancelled { .. } => "cancelled",
            Self::Configuration { .. } => "configuration",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Classify a failure returned by caller-supplied work.
///
/// Work signals cancellation by returning [`CoordinatorError::Cancelled`]
/// (possibly wrapped in `anyhow` context); anything else is a real failure
/// the coordinator propagates unchanged.
pub fn signals_cancellation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CoordinatorError>()
        .is_some_and(CoordinatorError::is_cancellation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoordinatorError::cancelled("session-1");
        assert!(err.is_cancellation());
        assert_eq!(err.category(), "cancelled");

        let err = CoordinatorError::configuration_field("must be greater than 0", "max_history");
        assert!(!err.is_cancellation());
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_signals_cancellation() {
        let err = anyhow::Error::from(CoordinatorError::cancelled("session-1"));
        assert!(signals_cancellation(&err));

        let err = anyhow::anyhow!("backend unavailable");
        assert!(!signals_cancellation(&err));
    }

    #[test]
    fn test_cancellation_with_reason() {
        let err = anyhow::Error::from(CoordinatorError::cancelled_with_reason(
            "session-1",
            "superseded",
        ));
        assert!(signals_cancellation(&err));
        assert!(err.to_string().contains("session-1"));
    }
}
