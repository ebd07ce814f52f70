use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{CryptoRng, RngCore};
use tollgate_cookie::{
    build_removal, parse, serialize, CookieAttributes, CookieError, CookieRecord,
};
use tollgate_error::ConfigError;

use crate::{
    session::short_id, Session, SessionManagerConfig, SessionStore, SessionStoreRegistry,
    StoreError,
};

/// Length of a session id before encoding.
const SESSION_ID_BYTES: usize = 32;

/// Errors raised while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session store backend failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session cookie could not be written
    #[error(transparent)]
    Cookie(#[from] CookieError),
}

/// Generates a session id: 32 random bytes, base64url encoded without padding.
pub fn generate_session_id<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Binds HTTP exchanges to sessions through a cookie.
pub struct SessionManager {
    config: SessionManagerConfig,
    attributes: CookieAttributes,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager using the backend named in `config`.
    ///
    /// Fails with [`ConfigError::UnknownBackend`] if `registry` has no such backend, or if the
    /// cookie settings are unusable.
    pub fn new(
        config: SessionManagerConfig,
        registry: &SessionStoreRegistry,
    ) -> Result<Self, ConfigError> {
        let factory = registry.resolve(&config.store_backend_name)?;
        Self::with_store(config, factory())
    }

    /// Creates a manager using `store` directly, ignoring `config.store_backend_name`.
    pub fn with_store(
        config: SessionManagerConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let attributes = CookieAttributes::from(&config.cookie_attributes);

        let probe = CookieRecord::with_attributes(&config.cookie_name, "", &attributes);
        serialize(&probe)
            .map_err(|_| ConfigError::InvalidCookieName(config.cookie_name.clone()))?;
        probe
            .check_security()
            .map_err(|e| ConfigError::InsecureCookie(e.to_string()))?;

        Ok(Self {
            config,
            attributes,
            store,
        })
    }

    /// The manager's settings.
    pub fn config(&self) -> &SessionManagerConfig {
        &self.config
    }

    /// The session store backing this manager.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Returns the session for this request, starting a new one if needed.
    ///
    /// `cookie_header` is the raw `Cookie` request header, empty if absent. When a new session
    /// is started its `Set-Cookie` value is passed to `set_cookie`.
    pub fn start(
        &self,
        cookie_header: &str,
        set_cookie: impl FnOnce(String),
    ) -> Result<Arc<Session>, SessionError> {
        self.start_with_rng(cookie_header, set_cookie, &mut rand::thread_rng())
    }

    /// Like [`SessionManager::start`], drawing new session ids from `rng`.
    pub fn start_with_rng<R: RngCore + CryptoRng>(
        &self,
        cookie_header: &str,
        set_cookie: impl FnOnce(String),
        rng: &mut R,
    ) -> Result<Arc<Session>, SessionError> {
        if let Some(id) = self.session_id(cookie_header) {
            return Ok(self.store.init(&id)?);
        }

        // create() is an atomic insert-if-absent, so a colliding id is never handed out twice.
        let session = loop {
            match self.store.create(&generate_session_id(rng))? {
                Some(session) => break session,
                None => tracing::debug!("Session id collision, generating another"),
            }
        };
        let cookie = serialize(&CookieRecord::with_attributes(
            &self.config.cookie_name,
            session.id(),
            &self.attributes,
        ))?;

        tracing::debug!(session = %short_id(session.id()), "Started new session");
        set_cookie(cookie);
        Ok(session)
    }

    /// Returns the session named by the request's cookie, without creating one.
    pub fn read(&self, cookie_header: &str) -> Result<Option<Arc<Session>>, SessionError> {
        match self.session_id(cookie_header) {
            Some(id) => Ok(self.store.read(&id)?),
            None => Ok(None),
        }
    }

    /// Ends a session and expires its cookie.
    ///
    /// Destroys the session `id`, or the one named by the request's cookie when `id` is `None`.
    /// The removal `Set-Cookie` value is always passed to `set_cookie`.
    pub fn destroy(
        &self,
        cookie_header: &str,
        set_cookie: impl FnOnce(String),
        id: Option<&str>,
    ) -> Result<(), SessionError> {
        let id = id
            .map(str::to_owned)
            .or_else(|| self.session_id(cookie_header));

        set_cookie(build_removal(&self.config.cookie_name, &self.attributes)?);

        if let Some(id) = id {
            self.store.destroy(&id)?;
            tracing::debug!(session = %short_id(&id), "Destroyed session");
        }
        Ok(())
    }

    /// Extracts the session id from a `Cookie` header.
    ///
    /// Malformed headers are attacker controlled, so they are treated as carrying no session.
    fn session_id(&self, cookie_header: &str) -> Option<String> {
        if cookie_header.trim().is_empty() {
            return None;
        }

        match parse(cookie_header) {
            Ok(mut cookies) => cookies
                .remove(&self.config.cookie_name)
                .map(|cookie| cookie.value)
                .filter(|value| !value.is_empty()),
            Err(error) => {
                tracing::debug!(%error, "Ignoring malformed cookie header");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tollgate_cookie::SameSite;

    use super::*;
    use crate::{InMemorySessionStore, SessionCookieAttributes};

    fn manager() -> SessionManager {
        SessionManager::new(
            SessionManagerConfig::default(),
            &SessionStoreRegistry::with_defaults(),
        )
        .unwrap()
    }

    fn start_new(manager: &SessionManager) -> (Arc<Session>, String) {
        let mut issued = None;
        let session = manager.start("", |c| issued = Some(c)).unwrap();
        (session, issued.expect("a Set-Cookie value"))
    }

    #[test]
    fn test_session_id_is_32_random_bytes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = generate_session_id(&mut rng);

        assert_eq!(id.len(), 43);
        assert_eq!(URL_SAFE_NO_PAD.decode(&id).unwrap().len(), 32);
        assert_ne!(id, generate_session_id(&mut rng));
    }

    #[test]
    fn test_unknown_backend_is_fatal() {
        let config = SessionManagerConfig {
            store_backend_name: "redis".to_string(),
            ..Default::default()
        };

        assert_eq!(
            SessionManager::new(config, &SessionStoreRegistry::with_defaults()).unwrap_err(),
            ConfigError::UnknownBackend("redis".to_string())
        );
    }

    #[test]
    fn test_invalid_cookie_name_is_fatal() {
        let config = SessionManagerConfig {
            cookie_name: "my session".to_string(),
            ..Default::default()
        };

        assert_eq!(
            SessionManager::new(config, &SessionStoreRegistry::with_defaults()).unwrap_err(),
            ConfigError::InvalidCookieName("my session".to_string())
        );
    }

    #[test]
    fn test_host_prefix_requires_secure_cookie() {
        let config = SessionManagerConfig {
            cookie_name: "__Host-sid".to_string(),
            cookie_attributes: SessionCookieAttributes {
                secure: false,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            SessionManager::new(config, &SessionStoreRegistry::with_defaults()),
            Err(ConfigError::InsecureCookie(_))
        ));
    }

    #[test]
    fn test_new_session_cookie_uses_secure_defaults() {
        let (session, cookie) = start_new(&manager());

        assert_eq!(
            cookie,
            format!(
                "sid={}; Path=/; Secure; HttpOnly; SameSite=Strict",
                session.id()
            )
        );
    }

    #[test]
    fn test_configured_attributes_are_applied() {
        let config = SessionManagerConfig {
            cookie_attributes: SessionCookieAttributes {
                same_site: SameSite::Lax,
                max_age: Some(600),
                domain: Some("example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let manager =
            SessionManager::new(config, &SessionStoreRegistry::with_defaults()).unwrap();
        let (session, cookie) = start_new(&manager);

        assert_eq!(
            cookie,
            format!(
                "sid={}; Domain=example.com; Path=/; Max-Age=600; Secure; HttpOnly; SameSite=Lax",
                session.id()
            )
        );
    }

    #[test]
    fn test_existing_cookie_does_not_set_cookie() {
        let manager = manager();
        let (first, _) = start_new(&manager);

        let mut issued = false;
        let second = manager
            .start(&format!("theme=dark; sid={}", first.id()), |_| issued = true)
            .unwrap();

        assert!(!issued);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_empty_cookie_value_starts_new_session() {
        let manager = manager();
        let mut issued = None;
        let session = manager.start("sid=", |c| issued = Some(c)).unwrap();

        assert!(!session.id().is_empty());
        assert!(issued.is_some());
    }

    #[test]
    fn test_malformed_cookie_header_starts_new_session() {
        let manager = manager();
        let mut issued = None;
        let session = manager.start("=oops; sid=abc", |c| issued = Some(c)).unwrap();

        assert_ne!(session.id(), "abc");
        assert!(issued.is_some());
    }

    #[test]
    fn test_read_does_not_create() {
        let manager = manager();

        assert!(manager.read("").unwrap().is_none());
        assert!(manager.read("sid=unknown").unwrap().is_none());

        let (session, _) = start_new(&manager);
        let found = manager
            .read(&format!("sid={}", session.id()))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&session, &found));
    }

    #[test]
    fn test_destroy_uses_cookie_id_by_default() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::with_store(SessionManagerConfig::default(), store.clone())
            .unwrap();
        let (session, _) = start_new(&manager);

        let mut removal = None;
        manager
            .destroy(&format!("sid={}", session.id()), |c| removal = Some(c), None)
            .unwrap();

        assert!(store.is_empty());
        assert_eq!(
            removal.unwrap(),
            "sid=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Secure; HttpOnly; \
             SameSite=Strict"
        );
    }

    #[test]
    fn test_destroy_explicit_id() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::with_store(SessionManagerConfig::default(), store.clone())
            .unwrap();
        let (keep, _) = start_new(&manager);
        let (ended, _) = start_new(&manager);

        let mut removal = None;
        manager
            .destroy(&format!("sid={}", keep.id()), |c| removal = Some(c), Some(ended.id()))
            .unwrap();

        assert!(removal.is_some());
        assert!(store.read(keep.id()).unwrap().is_some());
        assert!(store.read(ended.id()).unwrap().is_none());
    }

    #[test]
    fn test_destroy_without_session_only_expires_cookie() {
        let manager = manager();
        let mut removal = None;

        manager.destroy("", |c| removal = Some(c), None).unwrap();
        assert!(removal.unwrap().starts_with("sid=;"));
    }

    #[test]
    fn test_backend_errors_propagate() {
        struct FailingStore;

        impl SessionStore for FailingStore {
            fn init(&self, _id: &str) -> Result<Arc<Session>, StoreError> {
                Err(StoreError::Backend("offline".to_string()))
            }
            fn read(&self, _id: &str) -> Result<Option<Arc<Session>>, StoreError> {
                Err(StoreError::Backend("offline".to_string()))
            }
            fn create(&self, _id: &str) -> Result<Option<Arc<Session>>, StoreError> {
                Err(StoreError::Backend("offline".to_string()))
            }
            fn destroy(&self, _id: &str) -> Result<(), StoreError> {
                Err(StoreError::Backend("offline".to_string()))
            }
        }

        let registry = SessionStoreRegistry::new();
        registry
            .register("failing", || Arc::new(FailingStore) as Arc<dyn SessionStore>)
            .unwrap();
        let config = SessionManagerConfig {
            store_backend_name: "failing".to_string(),
            ..Default::default()
        };
        let manager = SessionManager::new(config, &registry).unwrap();

        let mut issued = false;
        let result = manager.start("", |_| issued = true);
        assert!(matches!(result, Err(SessionError::Store(_))));
        assert!(!issued);
        assert!(matches!(manager.read("sid=abc"), Err(SessionError::Store(_))));
    }

    #[test]
    fn test_only_the_created_id_reaches_the_cookie() {
        /// Reports the first `collisions` ids as taken and records every id it was offered.
        struct CrowdedStore {
            inner: InMemorySessionStore,
            collisions: usize,
            offered: std::sync::Mutex<Vec<String>>,
        }

        impl SessionStore for CrowdedStore {
            fn init(&self, id: &str) -> Result<Arc<Session>, StoreError> {
                self.inner.init(id)
            }
            fn read(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError> {
                self.inner.read(id)
            }
            fn create(&self, id: &str) -> Result<Option<Arc<Session>>, StoreError> {
                let mut offered = self.offered.lock().unwrap();
                offered.push(id.to_string());
                if offered.len() <= self.collisions {
                    return Ok(None);
                }
                self.inner.create(id)
            }
            fn destroy(&self, id: &str) -> Result<(), StoreError> {
                self.inner.destroy(id)
            }
        }

        let store = Arc::new(CrowdedStore {
            inner: InMemorySessionStore::new(),
            collisions: 3,
            offered: Default::default(),
        });
        let manager =
            SessionManager::with_store(SessionManagerConfig::default(), store.clone()).unwrap();

        let mut cookies = Vec::new();
        let session = manager
            .start_with_rng("", |c| cookies.push(c), &mut ChaCha8Rng::seed_from_u64(9))
            .unwrap();

        let offered = store.offered.lock().unwrap();
        assert_eq!(offered.len(), 4);
        assert_eq!(offered.last().map(String::as_str), Some(session.id()));
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with(&format!("sid={};", session.id())));
        for rejected in &offered[..3] {
            assert!(!cookies[0].contains(rejected.as_str()));
        }
    }
}
