use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, RwLock},
};

use tollgate_error::ConfigError;

use crate::{InMemorySessionStore, SessionStore};

/// Name under which [`SessionStoreRegistry::with_defaults`] registers [`InMemorySessionStore`].
pub const MEMORY_BACKEND: &str = "memory";

/// Constructor for a session store backend.
pub type StoreFactory = Arc<dyn Fn() -> Arc<dyn SessionStore> + Send + Sync>;

/// A registry of session store backends, keyed by name.
///
/// Registrations are append-only: a name can be registered once and never removed. The registry
/// is an ordinary value handed to [`crate::SessionManager::new`], so tests can build isolated
/// registries.
pub struct SessionStoreRegistry {
    factories: RwLock<HashMap<String, StoreFactory>>,
}

impl std::fmt::Debug for SessionStoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStoreRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

impl SessionStoreRegistry {
    /// Creates a new empty `SessionStoreRegistry`.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        SessionStoreRegistry {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with the in-memory backend registered as [`MEMORY_BACKEND`].
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .factories
            .write()
            .expect("RwLock should not be poisoned")
            .insert(MEMORY_BACKEND.to_string(), memory_factory());
        registry
    }

    /// Registers a backend constructor under `name`.
    ///
    /// Fails with [`ConfigError::DuplicateBackend`] if the name is taken.
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Result<(), ConfigError>
    where
        F: Fn() -> Arc<dyn SessionStore> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut factories = self
            .factories
            .write()
            .expect("RwLock should not be poisoned");

        match factories.entry(name) {
            Entry::Occupied(entry) => Err(ConfigError::DuplicateBackend(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(backend = %entry.key(), "Registered session store backend");
                entry.insert(Arc::new(factory));
                Ok(())
            }
        }
    }

    /// Retrieves the constructor registered under `name`.
    ///
    /// Fails with [`ConfigError::UnknownBackend`] if nothing is registered under that name.
    pub fn resolve(&self, name: &str) -> Result<StoreFactory, ConfigError> {
        self.factories
            .read()
            .expect("RwLock should not be poisoned")
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))
    }

    /// Names of all registered backends, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .expect("RwLock should not be poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

fn memory_factory() -> StoreFactory {
    Arc::new(|| Arc::new(InMemorySessionStore::new()) as Arc<dyn SessionStore>)
}
