//! Per-card persistence of the learner's in-progress selection.
//!
//! Saved selections only let a learner pick up where they left off; grading never depends on
//! them. [`SelectionStore`] therefore never reports a failure: a backend error or a corrupt
//! payload reads as "nothing saved" and a failed write is dropped.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::choice::ChoicePosition;
use crate::identity::CardIdentity;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage access failed: {0}")]
    Access(String),
}

/// String key-value storage the selection records live in.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process backend, used outside the browser.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Selection saved for one card identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRecord {
    pub selected: BTreeSet<ChoicePosition>,
    pub saved_at: DateTime<Utc>,
}

impl SelectionRecord {
    pub fn new(selected: BTreeSet<ChoicePosition>, saved_at: DateTime<Utc>) -> Self {
        Self { selected, saved_at }
    }

    pub fn now(selected: BTreeSet<ChoicePosition>) -> Self {
        Self::new(selected, Utc::now())
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn to_payload(&self) -> String {
        let payload = serde_json::json!({
            "selected": self.selected.iter().map(|position| position.get()).collect::<Vec<_>>(),
            "ts": self.saved_at.timestamp(),
        });
        payload.to_string()
    }

    /// Decodes a stored payload. Entries of `selected` may be numbers or numeric strings;
    /// anything that is not a valid position is skipped. A payload without a `selected` array
    /// is rejected.
    fn from_payload(raw: &str) -> Option<Self> {
        let payload: Value = serde_json::from_str(raw).ok()?;
        let entries = payload.get("selected")?.as_array()?;

        let selected = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Number(number) => number.as_i64(),
                Value::String(text) => text.trim().parse().ok(),
                _ => None,
            })
            .filter_map(|value| ChoicePosition::try_from(value).ok())
            .collect();

        let saved_at = payload
            .get("ts")
            .and_then(Value::as_i64)
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Some(Self { selected, saved_at })
    }
}

/// Best-effort selection storage keyed by [`CardIdentity::storage_key`].
#[derive(Debug)]
pub struct SelectionStore<B> {
    backend: B,
}

impl<B: StorageBackend> SelectionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get(&self, identity: &CardIdentity) -> Option<SelectionRecord> {
        let key = identity.storage_key();

        let raw = match self.backend.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::debug!("Reading saved selection {} failed: {}", key, error);
                return None;
            }
        };

        let record = SelectionRecord::from_payload(&raw);
        if record.is_none() {
            tracing::debug!("Ignoring malformed saved selection under {}", key);
        }
        record
    }

    pub fn set(&mut self, identity: &CardIdentity, record: &SelectionRecord) {
        let key = identity.storage_key();

        if let Err(error) = self.backend.write(&key, &record.to_payload()) {
            tracing::debug!("Saving selection {} failed: {}", key, error);
        }
    }

    pub fn delete(&mut self, identity: &CardIdentity) {
        let key = identity.storage_key();

        if let Err(error) = self.backend.remove(&key) {
            tracing::debug!("Removing saved selection {} failed: {}", key, error);
        }
    }
}
