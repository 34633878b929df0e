//! Typed access to the persisted scheduler and sitemap state
//!
//! Every value is stored as a JSON blob under a fixed key:
//!
//! | Key | Value |
//! |-----|-------|
//! | `scheduler.config` | `UpdateTaskConfig` |
//! | `scheduler.history` | `Vec<UpdateTaskResult>` (newest 50) |
//! | `scheduler.last_update` | RFC 3339 timestamp of the last completed run |
//! | `sitemap.snapshot.<site id>` | latest successful `SitemapSnapshot` |

use crate::config::UpdateTaskConfig;
use crate::scheduler::UpdateTaskResult;
use crate::sitemap::SitemapSnapshot;
use crate::storage::memory::MemoryStorage;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};

const CONFIG_KEY: &str = "scheduler.config";
const HISTORY_KEY: &str = "scheduler.history";
const LAST_UPDATE_KEY: &str = "scheduler.last_update";
const SNAPSHOT_PREFIX: &str = "sitemap.snapshot.";

/// Maximum number of task results kept in history
pub const HISTORY_LIMIT: usize = 50;

/// Shared handle over a storage backend
///
/// Cloning is cheap; all clones use the same backend. Each operation takes
/// the lock once, so read-modify-write sequences are not interleaved.
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<Mutex<Box<dyn Storage>>>,
}

impl StateStore {
    pub fn new<S: Storage + 'static>(storage: S) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Box::new(storage))),
        }
    }

    /// A store backed by a fresh `MemoryStorage`
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    fn with_backend<T>(
        &self,
        f: impl FnOnce(&mut dyn Storage) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut guard = self.backend.lock().map_err(|_| StorageError::Poisoned)?;
        f(guard.as_mut())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        self.with_backend(|backend| read_json(backend, key))
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.with_backend(|backend| backend.set(key, &encoded))
    }

    // ===== Scheduler config =====

    pub fn load_task_config(&self) -> StorageResult<Option<UpdateTaskConfig>> {
        self.read_json(CONFIG_KEY)
    }

    pub fn save_task_config(&self, config: &UpdateTaskConfig) -> StorageResult<()> {
        self.write_json(CONFIG_KEY, config)
    }

    // ===== Task history =====

    /// Loads the history, newest `start_time` first
    pub fn load_history(&self) -> StorageResult<Vec<UpdateTaskResult>> {
        let mut history: Vec<UpdateTaskResult> = self.read_json(HISTORY_KEY)?.unwrap_or_default();
        history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(history)
    }

    /// Appends a task result, evicting the oldest entries beyond `HISTORY_LIMIT`
    ///
    /// A result with the same `task_id` as a stored one replaces it.
    pub fn append_history(&self, task: &UpdateTaskResult) -> StorageResult<()> {
        self.with_backend(|backend| {
            let mut history: Vec<UpdateTaskResult> =
                read_json(backend, HISTORY_KEY)?.unwrap_or_default();

            history.retain(|existing| existing.task_id != task.task_id);
            history.push(task.clone());
            history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            history.truncate(HISTORY_LIMIT);

            let encoded = serde_json::to_string(&history)?;
            backend.set(HISTORY_KEY, &encoded)
        })
    }

    pub fn clear_history(&self) -> StorageResult<()> {
        self.with_backend(|backend| backend.remove(HISTORY_KEY))
    }

    // ===== Last update =====

    pub fn last_update(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.read_json(LAST_UPDATE_KEY)
    }

    pub fn set_last_update(&self, at: DateTime<Utc>) -> StorageResult<()> {
        self.write_json(LAST_UPDATE_KEY, &at)
    }

    // ===== Sitemap snapshots =====

    pub fn load_snapshot(&self, website_id: &str) -> StorageResult<Option<SitemapSnapshot>> {
        self.read_json(&snapshot_key(website_id))
    }

    pub fn save_snapshot(&self, snapshot: &SitemapSnapshot) -> StorageResult<()> {
        self.write_json(&snapshot_key(&snapshot.website_id), snapshot)
    }

    /// Ids of all sites with a stored snapshot
    pub fn snapshot_site_ids(&self) -> StorageResult<Vec<String>> {
        let keys = self.with_backend(|backend| backend.keys_with_prefix(SNAPSHOT_PREFIX))?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(SNAPSHOT_PREFIX).map(str::to_string))
            .collect())
    }
}

fn snapshot_key(website_id: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{website_id}")
}

fn read_json<T: DeserializeOwned>(backend: &mut dyn Storage, key: &str) -> StorageResult<Option<T>> {
    match backend.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}
