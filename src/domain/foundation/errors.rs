//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction and state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        ValidationError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_displays_correctly() {
        let err = ValidationError::empty_field("description");
        assert_eq!(err.to_string(), "Field 'description' cannot be empty");
    }

    #[test]
    fn invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("image", "missing mime type");
        assert_eq!(
            err.to_string(),
            "Field 'image' has invalid format: missing mime type"
        );
    }

    #[test]
    fn invalid_transition_displays_correctly() {
        let err = ValidationError::invalid_transition("Input", "Done");
        assert_eq!(err.to_string(), "Cannot transition from Input to Done");
    }
}
