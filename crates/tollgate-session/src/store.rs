use std::sync::Arc;

use crate::Session;

/// An error reported by a session store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not complete the operation (I/O, connection loss, etc.)
    #[error("Session store operation failed: {0}")]
    Backend(String),
}

/// Abstraction for session storage backends.
///
/// Implementations own the id to [`Session`] mapping and must make [`SessionStore::init`] and
/// [`SessionStore::create`] atomic per id when called concurrently.
pub trait SessionStore: Send + Sync {
    /// Returns the session for `id`, creating an empty one if none exists.
    fn init(&self, id: &str) -> Result<Arc<Session>, StoreError>;

    /// Returns the session for `id` without creating one.
    fn read(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError>;

    /// Creates an empty session for `id` only if the id is unused.
    ///
    /// Returns `None` when a session with this id already exists.
    fn create(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError>;

    /// Removes the session for `id`.
    ///
    /// Returns Ok even if the session doesn't exist (idempotent operation).
    fn destroy(&self, id: &str) -> Result<(), StoreError>;
}
