#![doc = include_str!("../README.md")]

mod config;
pub use config::{SessionCookieAttributes, SessionManagerConfig};
mod in_memory_session_store;
pub use in_memory_session_store::InMemorySessionStore;
mod manager;
pub use manager::{generate_session_id, SessionError, SessionManager};
/// Registry of named session store backends.
pub mod registry;
pub use registry::{SessionStoreRegistry, StoreFactory, MEMORY_BACKEND};
mod session;
pub use session::Session;
mod store;
pub use store::{SessionStore, StoreError};

pub use tollgate_error::ConfigError;
