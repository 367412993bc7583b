//! Rolling log of failed tag checks.
//!
//! The log is a single newest-first sequence stored under one option key.
//! Appending reads the whole sequence, prepends, truncates to the capacity
//! and writes it back. There is no locking: two checks racing on `append`
//! can lose an entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{DEFAULT_LOG_CAPACITY, ERROR_LOG_KEY};
use crate::error::{FetchError, FetchFailure, StoreError};
use crate::store::OptionStore;

/// One failed remote check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// Extension identifier.
    pub item: String,
    /// When the check failed.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    /// Endpoint or reference that was being checked.
    #[serde(default)]
    pub target: String,
    /// Raw failure detail.
    pub response: FetchFailure,
}

impl ErrorLogEntry {
    /// Build an entry for `item` from a fetch failure.
    pub fn from_fetch_error(item: impl Into<String>, error: &FetchError) -> Self {
        Self {
            item: item.into(),
            time: error.occurred_at,
            target: error.target.clone(),
            response: error.failure.clone(),
        }
    }
}

/// Capacity-bounded, newest-first error log.
pub struct ErrorLog {
    store: Arc<dyn OptionStore>,
    key: String,
    capacity: usize,
}

impl ErrorLog {
    /// Create a log over `store` with the default key and capacity.
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self::with_capacity(store, DEFAULT_LOG_CAPACITY)
    }

    /// Create a log with a custom capacity (at least one entry is kept).
    pub fn with_capacity(store: Arc<dyn OptionStore>, capacity: usize) -> Self {
        Self {
            store,
            key: ERROR_LOG_KEY.to_string(),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Option key the log is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw persisted sequence. A missing key or a value that is not an
    /// array reads as empty.
    fn stored_items(&self) -> Result<Vec<Value>, StoreError> {
        match self.store.get(&self.key)? {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => {
                warn!("Error log under '{}' is not a sequence, ignoring it", self.key);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Read the persisted entries, newest first.
    ///
    /// Elements that do not decode as entries are skipped here but stay in
    /// the stored sequence.
    pub fn load(&self) -> Result<Vec<ErrorLogEntry>, StoreError> {
        let items = self.stored_items()?;
        let total = items.len();

        let entries: Vec<ErrorLogEntry> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        if entries.len() < total {
            warn!(
                "Skipped {} undecodable entries in error log '{}'",
                total - entries.len(),
                self.key
            );
        }
        Ok(entries)
    }

    /// Prepend `entry` and persist, dropping the oldest elements past the
    /// capacity.
    pub fn append(&self, entry: ErrorLogEntry) -> Result<(), StoreError> {
        let encode_err = |e: serde_json::Error| StoreError::Encode {
            key: self.key.clone(),
            message: e.to_string(),
        };

        let mut items = self.stored_items()?;
        items.insert(0, serde_json::to_value(&entry).map_err(encode_err)?);
        items.truncate(self.capacity);

        let len = items.len();
        self.store.set(&self.key, Value::Array(items))?;

        debug!("Error log now holds {} entries", len);
        Ok(())
    }
}
