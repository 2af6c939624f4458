//! Key-value persistence collaborator.
//!
//! The engine persists through [`KeyValueStore`] and treats every failure as
//! recoverable: a `false` from `save` or a `None` from `load` is logged by the
//! caller and the engine carries on with its in-memory state. The browser
//! implementation lives in [`crate::web`]; [`MemoryStore`] backs tests and the
//! CLI.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait KeyValueStore {
    /// Store `blob` under `key`. Returns `false` when the write failed.
    fn save(&self, key: &str, blob: &str) -> bool;
    /// Fetch the blob under `key`, `None` when missing or unavailable.
    fn load(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
}

/// Serialize `value` as JSON and save it. Logs and returns `false` on failure.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "persist: serialize failed");
            return false;
        }
    };
    let saved = store.save(key, &raw);
    if !saved {
        tracing::warn!(key, "persist: store write failed; continuing in memory");
    }
    saved
}

/// Load and parse a JSON value. Missing keys and corrupt blobs yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.load(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "persist: stored blob unreadable; ignoring");
            None
        }
    }
}

/// In-memory store. Can be switched into a failing mode to exercise the
/// unavailable-storage paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    failing: Cell<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `save` returns `false` and `load` returns `None`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: &str, blob: &str) -> bool {
        if self.failing.get() {
            return false;
        }
        self.entries.borrow_mut().insert(key.to_owned(), blob.to_owned());
        true
    }

    fn load(&self, key: &str) -> Option<String> {
        if self.failing.get() {
            return None;
        }
        self.entries.borrow().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
