//! Storage traits and error types
//!
//! This module defines the key/value interface every storage backend offers
//! and the associated error type.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Values are opaque strings (JSON in practice). Writers take `&mut self`;
/// callers sharing a backend across tasks wrap it in a mutex.
pub trait Storage: Send {
    /// Reads a value, `None` if the key is absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes a key; deleting an absent key is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Lists keys starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
