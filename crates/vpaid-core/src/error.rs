//! Error types for VPAID Core

use crate::attributes::AttributeField;
use crate::events::EventKind;
use thiserror::Error;

/// Result type alias for creative operations
pub type Result<T> = std::result::Result<T, Error>;

/// Creative error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Ad parameter errors
    #[error("Malformed ad parameters: {0}")]
    MalformedParameters(String),

    // Attribute errors
    #[error("Unknown attribute: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: AttributeField, reason: String },

    // Dispatch errors
    #[error("No handler subscribed for {0}")]
    UnsubscribedHandler(EventKind),

    // Lifecycle errors
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an invalid value error
    pub fn invalid(field: AttributeField, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if the creative instance can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidValue { .. } | Error::UnsubscribedHandler(_) | Error::UnknownField(_)
        )
    }

    /// Returns the error code reported to the host
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MalformedParameters(_) => "MALFORMED_PARAMETERS",
            Error::UnknownField(_) => "UNKNOWN_FIELD",
            Error::InvalidValue { .. } => "INVALID_VALUE",
            Error::UnsubscribedHandler(_) => "UNSUBSCRIBED_HANDLER",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::MalformedParameters("empty".into());
        assert_eq!(err.error_code(), "MALFORMED_PARAMETERS");
        assert!(!err.is_recoverable());

        let err = Error::invalid(AttributeField::Volume, "out of range");
        assert_eq!(err.error_code(), "INVALID_VALUE");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Invalid value for volume: out of range");
    }
}
