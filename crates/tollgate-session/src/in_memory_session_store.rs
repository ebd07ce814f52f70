use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, RwLock},
};

use crate::{Session, SessionStore, StoreError};

/// In-memory session storage using HashMap with RwLock for thread-safe access.
///
/// Sessions live until destroyed or until the process exits. Suitable for single-process
/// deployments, development and testing.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("RwLock should not be poisoned")
            .len()
    }

    /// Returns true if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn init(&self, id: &str) -> Result<Arc<Session>, StoreError> {
        if let Some(session) = self
            .sessions
            .read()
            .expect("RwLock should not be poisoned")
            .get(id)
        {
            return Ok(session.clone());
        }

        // Another writer may have inserted the id since the read lock was released.
        let mut sessions = self.sessions.write().expect("RwLock should not be poisoned");
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Session::new(id)));
        Ok(session.clone())
    }

    fn read(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError> {
        let sessions = self.sessions.read().expect("RwLock should not be poisoned");
        Ok(sessions.get(id).cloned())
    }

    fn create(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError> {
        let mut sessions = self.sessions.write().expect("RwLock should not be poisoned");
        match sessions.entry(id.to_string()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(entry) => Ok(Some(entry.insert(Arc::new(Session::new(id))).clone())),
        }
    }

    fn destroy(&self, id: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().expect("RwLock should not be poisoned");
        sessions.remove(id);
        Ok(())
    }
}
