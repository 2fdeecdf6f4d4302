//! Error types for the flow contract layer.

use thiserror::Error;

/// Failure of a single flow invocation.
///
/// Nothing here is process-fatal; every variant is scoped to the one call
/// that produced it.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Input failed schema validation. The model was never called.
    #[error("invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The network call to the model backend failed or timed out.
    #[error("model backend unavailable: {0}")]
    ModelUnavailable(String),

    /// The model responded but the JSON did not satisfy the output schema.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}

impl FlowError {
    /// Single user-displayable message for the adapter boundary.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::InvalidInput { field, reason } => {
                format!("Please check the '{}' field: {}.", field, reason)
            }
            FlowError::ModelUnavailable(_) => {
                "The assistant is unavailable right now. Please try again.".to_string()
            }
            FlowError::MalformedOutput(_) => {
                "The assistant returned an unexpected answer. Please try again.".to_string()
            }
        }
    }
}

/// First schema violation found while validating a candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted/indexed path of the offending field, e.g. `photos[2]`.
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_never_leaks_internals() {
        let err = FlowError::MalformedOutput("missing field 'categories'".to_string());
        let msg = err.user_message();
        assert!(!msg.contains("categories"));
        assert!(msg.contains("try again"));
    }

    #[test]
    fn test_invalid_input_names_field() {
        let err = FlowError::InvalidInput {
            field: "photos".to_string(),
            reason: "expected an array".to_string(),
        };
        assert!(err.user_message().contains("photos"));
    }
}
