//! Error types for the storage module.
//!
//! One error type covers both the graph store and the relational lesson store.

use thiserror::Error;

/// Unified error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// Initialization failure (startup, connection).
    #[error("Initialization failed: {0}")]
    Init(String),

    /// Query execution error (invalid syntax, timeout).
    #[error("Query error: {0}")]
    Query(String),

    /// A stored row could not be mapped back to its type.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error for file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an initialization error with the given message.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
