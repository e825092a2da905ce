//! Key-value persistence
//!
//! All application state is stored as JSON strings under a handful of fixed
//! keys. The [`KeyValueStore`] trait keeps the rest of the crate agnostic of
//! where those strings live:
//! - [`MemoryStore`] - process-local map, for tests and throwaway sessions
//! - [`SqliteStore`] - single-table SQLite database on disk

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};

mod sqlite;

pub use sqlite::SqliteStore;

/// Storage keys for persisted records
pub mod keys {
    pub const TRANSACTIONS: &str = "transactions";
    pub const BUDGET: &str = "budget";
    pub const SAVINGS_GOALS: &str = "savings_goals";
    pub const DETECTION_SETTINGS: &str = "detection_settings";
    pub const DETECTION_CONSENT: &str = "detection_consent";
    pub const PROCESSED_IDS: &str = "processed_transaction_ids";
}

/// String-to-string persistent store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Read-modify-write one key with no other writer in between
    ///
    /// `apply` receives the current value and returns the new one. An error
    /// from `apply` leaves the stored value untouched.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let mut entries = self.entries()?;
        let value = apply(entries.get(key).cloned())?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
