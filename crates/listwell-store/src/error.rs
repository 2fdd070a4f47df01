//! Store error types

use thiserror::Error;

/// Listing store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether retrying the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Query(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<listwell_types::ListwellError> for StoreError {
    fn from(e: listwell_types::ListwellError) -> Self {
        StoreError::InvalidInput(e.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Connection("refused".into()).is_transient());
        assert!(StoreError::Query(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!StoreError::Query(sqlx::Error::RowNotFound).is_transient());
        assert!(!StoreError::Corrupt("capacity".into()).is_transient());
    }
}
