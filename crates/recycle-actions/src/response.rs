//! UI-facing response shape.

use serde::{Deserialize, Serialize};

/// What every action hands back to the UI: data or a displayable error
/// message, never both, never a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }
}
