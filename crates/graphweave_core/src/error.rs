//! Core error types for GRAPHWEAVE.

use crate::context::Interrupt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Payload could not be decoded
    #[error("Invalid encoding: {reason}")]
    InvalidEncoding {
        /// Decoder message
        reason: String,
    },

    /// A value had a different variant than required
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected variant name
        expected: &'static str,
        /// Actual variant name
        actual: &'static str,
    },

    /// The request was cancelled or ran past its deadline
    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::TypeMismatch {
            expected: "Int",
            actual: "String",
        };
        assert_eq!(format!("{}", err), "Type mismatch: expected Int, got String");
    }

    #[test]
    fn test_interrupt_is_transparent() {
        let err = CoreError::from(Interrupt::Cancelled);
        assert_eq!(err.to_string(), Interrupt::Cancelled.to_string());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CoreError::from(json_err);
        assert!(matches!(err, CoreError::InvalidEncoding { .. }));
    }
}
