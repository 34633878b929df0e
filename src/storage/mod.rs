//! Storage module for persisting harvest state
//!
//! This module handles:
//! - The narrow key/value `Storage` trait
//! - In-memory and SQLite backends
//! - Typed, JSON-encoded access to scheduler and sitemap state

mod memory;
mod schema;
mod sqlite;
mod state;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use state::{StateStore, HISTORY_LIMIT};
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens the SQLite database at `path` and wraps it in a `StateStore`
///
/// # Returns
///
/// * `Ok(StateStore)` - Ready to use
/// * `Err(StorageError)` - The database could not be opened or initialized
pub fn open_state_store(path: &Path) -> StorageResult<StateStore> {
    let storage = SqliteStorage::new(path)?;
    tracing::debug!("Opened state database at {}", path.display());
    Ok(StateStore::new(storage))
}
