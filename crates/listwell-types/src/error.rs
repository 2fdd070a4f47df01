//! Error types for Listwell domain values

use thiserror::Error;

/// Result type for Listwell domain operations
pub type Result<T> = std::result::Result<T, ListwellError>;

/// Listwell domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListwellError {
    /// A value failed validation
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
}

impl ListwellError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
        }
    }
}
