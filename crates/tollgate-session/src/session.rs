use std::{fmt, sync::RwLock};

use serde_json::{Map, Value};

/// Server-side state bound to one session id.
///
/// Stores hand out `Arc<Session>`, so every request carrying the same id sees the same data.
pub struct Session {
    id: String,
    data: RwLock<Map<String, Value>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The id is a bearer credential, only show enough of it to correlate logs.
        f.debug_struct("Session")
            .field("id", &short_id(&self.id))
            .field("entries", &self.len())
            .finish()
    }
}

impl Session {
    /// Creates an empty session.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: RwLock::new(Map::new()),
        }
    }

    /// The session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .expect("RwLock should not be poisoned")
            .get(key)
            .cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data
            .write()
            .expect("RwLock should not be poisoned")
            .insert(key.into(), value.into())
    }

    /// Removes the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data
            .write()
            .expect("RwLock should not be poisoned")
            .remove(key)
    }

    /// Removes all values.
    pub fn clear(&self) {
        self.data
            .write()
            .expect("RwLock should not be poisoned")
            .clear();
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.read().expect("RwLock should not be poisoned").len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of all stored values.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.read().expect("RwLock should not be poisoned").clone()
    }
}

pub(crate) fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(6).collect();
    format!("{prefix}…")
}
