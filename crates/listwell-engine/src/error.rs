//! Engine error types

use listwell_content::ContentError;
use listwell_store::StoreError;
use listwell_types::ListwellError;
use thiserror::Error;

/// Errors raised by the lifecycle controllers
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Content generation failed: {0}")]
    Content(#[from] ContentError),

    #[error(transparent)]
    Domain(#[from] ListwellError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether a later cycle could succeed where this one failed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Content(ContentError::Unavailable { .. }) => true,
            _ => false,
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
