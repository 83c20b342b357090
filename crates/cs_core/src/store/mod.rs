//! On-device persistence boundary.
//!
//! An opaque key-value store over JSON values. Writes are fire-and-forget
//! ("last write wins"); reads of anything absent or unreadable come back
//! as `None` so callers fall back to first-run defaults.

pub mod file;

use std::collections::HashMap;

use serde_json::Value;

/// Store keys for each persisted ledger.
pub mod keys {
    pub const DRAFT: &str = "cs.draft";
    pub const GAMES: &str = "cs.games";
    pub const ENTITLEMENT: &str = "cs.entitlement";
    pub const REDEMPTIONS: &str = "cs.redemptions";
    pub const SCOPES: &str = "cs.scopes";
}

pub trait KvStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: &Value);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &Value) {
        self.entries.insert(key.to_string(), value.clone());
    }
}
