use serde::{Deserialize, Serialize};
use tollgate_cookie::{CookieAttributes, Priority, SameSite};

use crate::MEMORY_BACKEND;

/// Settings for a [`crate::SessionManager`].
///
/// Defaults to
///
/// ```
/// # use tollgate_session::{SessionCookieAttributes, SessionManagerConfig};
/// # use tollgate_cookie::SameSite;
/// let config = SessionManagerConfig {
///     cookie_name: "sid".to_string(),
///     store_backend_name: "memory".to_string(),
///     cookie_attributes: SessionCookieAttributes {
///         path: "/".to_string(),
///         secure: true,
///         http_only: true,
///         same_site: SameSite::Strict,
///         max_age: None,
///         domain: None,
///         priority: None,
///     },
/// };
/// assert_eq!(config, SessionManagerConfig::default());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionManagerConfig {
    /// Name of the cookie carrying the session id. Defaults to `sid`
    pub cookie_name: String,
    /// Registry name of the session store backend. Defaults to `memory`
    pub store_backend_name: String,
    /// Attributes of the session cookie
    pub cookie_attributes: SessionCookieAttributes,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sid".into(),
            store_backend_name: MEMORY_BACKEND.into(),
            cookie_attributes: SessionCookieAttributes::default(),
        }
    }
}

/// Attributes written on the session cookie.
///
/// Defaults are the restrictive choice for a session credential: Secure, HttpOnly and
/// SameSite=Strict on path `/`, lasting for the browser session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionCookieAttributes {
    /// Cookie path. Defaults to `/`
    pub path: String,
    /// Secure attribute. Defaults to true
    pub secure: bool,
    /// HttpOnly attribute. Defaults to true
    pub http_only: bool,
    /// SameSite attribute. Defaults to Strict
    pub same_site: SameSite,
    /// Lifetime in seconds
    pub max_age: Option<i64>,
    /// Cookie domain
    pub domain: Option<String>,
    /// Priority attribute
    pub priority: Option<Priority>,
}

impl Default for SessionCookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".into(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
            max_age: None,
            domain: None,
            priority: None,
        }
    }
}

impl From<&SessionCookieAttributes> for CookieAttributes {
    fn from(attributes: &SessionCookieAttributes) -> Self {
        CookieAttributes {
            domain: attributes.domain.clone(),
            path: Some(attributes.path.clone()),
            expires: None,
            max_age: attributes.max_age,
            secure: attributes.secure,
            http_only: attributes.http_only,
            same_site: Some(attributes.same_site),
            priority: attributes.priority,
            signed: false,
        }
    }
}
