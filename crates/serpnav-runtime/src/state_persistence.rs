#![forbid(unsafe_code)]

//! Cross-navigation persistence of the last focused result.
//!
//! When the user follows a result, the navigator records where they were so
//! that returning to the exact same results page restores the highlight.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      NavigationStore                          │
//! │   - Typed load/save of PersistedNavigation                    │
//! │   - JSON encoding under a single key                          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     StorageBackend                            │
//! │   - MemoryStorage: in-memory (testing, ephemeral)             │
//! │   - localStorage: browser profile (serpnav-web)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Unavailable` | Storage disabled by the browser | Load yields nothing, save is logged |
//! | `StorageError::Serialization` | JSON encode failure | Save is logged and skipped |
//! | `StorageError::Corruption` | Stored text is not a record | Load yields nothing |
//! | Missing entry | First run | Load yields nothing |
//!
//! Nothing here ever panics or reaches the page user.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key the navigation record is stored under.
pub const NAVIGATION_KEY: &str = "serpnav.lastNavigation";

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Stored value is not in the expected format.
    #[error("storage corruption: {0}")]
    Corruption(String),
    /// Backend is not available (e.g. storage disabled by the browser).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Synchronous string key/value store.
///
/// Runs on the page's single UI thread, so no `Send`/`Sync` bound.
pub trait StorageBackend {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Stored value for `key`, or `None` on first run.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value for `key`.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage backend for testing and ephemeral state.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory storage pre-populated with entries.
    #[must_use]
    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::rc::Rc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation Record
// ─────────────────────────────────────────────────────────────────────────────

/// Where the user was when they last followed a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNavigation {
    /// Exact address of the results page.
    pub last_query_url: String,
    /// Focused result index at that moment, `None` when nothing was focused.
    pub last_focused_index: Option<usize>,
}

/// Typed access to the navigation record.
pub struct NavigationStore {
    backend: Box<dyn StorageBackend>,
}

impl std::fmt::Debug for NavigationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl NavigationStore {
    #[must_use]
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Store backed by [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Load the record. Missing, unreadable, or corrupt data yields `None`.
    #[must_use]
    pub fn load(&self) -> Option<PersistedNavigation> {
        match self.try_load() {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    message = "persistence.load_failed",
                    backend = self.backend.name(),
                    error = %err
                );
                None
            }
        }
    }

    /// Load the record, surfacing failures.
    pub fn try_load(&self) -> StorageResult<Option<PersistedNavigation>> {
        let Some(text) = self.backend.load(NAVIGATION_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StorageError::Corruption(e.to_string()))
    }

    /// Write the record.
    pub fn save(&self, record: &PersistedNavigation) -> StorageResult<()> {
        let text = serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.backend.save(NAVIGATION_KEY, &text)?;
        tracing::debug!(
            message = "persistence.saved",
            backend = self.backend.name(),
            url = %record.last_query_url,
            index = ?record.last_focused_index
        );
        Ok(())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.backend.remove(NAVIGATION_KEY)
    }
}
