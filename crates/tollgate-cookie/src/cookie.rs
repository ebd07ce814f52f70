use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CookieError;

const SECURE_PREFIX: &str = "__Secure-";
const HOST_PREFIX: &str = "__Host-";

/// Represents an HTTP cookie with its `Set-Cookie` attributes.
///
/// Security attributes include HttpOnly (prevents JavaScript access), Secure (HTTPS-only) and
/// SameSite (CSRF protection).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieRecord {
    /// Cookie name
    pub name: String,
    /// Cookie value, unencoded
    pub value: String,
    /// Cookie domain
    pub domain: Option<String>,
    /// Cookie path
    pub path: Option<String>,
    /// Cookie expiration timestamp
    pub expires: Option<DateTime<Utc>>,
    /// Lifetime in seconds; zero or negative deletes the cookie
    pub max_age: Option<i64>,
    /// Secure attribute (HTTPS-only)
    pub secure: bool,
    /// HttpOnly attribute (prevents JavaScript access)
    pub http_only: bool,
    /// SameSite attribute (CSRF protection)
    pub same_site: Option<SameSite>,
    /// Priority attribute
    pub priority: Option<Priority>,
    /// Marks the cookie as signed
    pub signed: bool,
}

/// SameSite cookie attribute for cross-site request policy.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Cookie only sent to same-site requests
    Strict,
    /// Cookie sent to same-site and top-level navigation
    Lax,
    /// Cookie sent to all requests (requires Secure=true in most browsers)
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Priority cookie attribute, used by browsers when evicting cookies.
#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        })
    }
}

/// Everything about a cookie except its name and value.
///
/// Fields mirror the attributes of [`CookieRecord`].
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieAttributes {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub priority: Option<Priority>,
    pub signed: bool,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            domain: None,
            path: Some("/".to_string()),
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
            priority: None,
            signed: false,
        }
    }
}

impl CookieRecord {
    /// Creates a new cookie with default attributes.
    ///
    /// Defaults: path="/", secure=false, http_only=false, no SameSite, no expiration.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_attributes(name, value, &CookieAttributes::default())
    }

    /// Creates a cookie carrying a copy of `attributes`.
    pub fn with_attributes(
        name: impl Into<String>,
        value: impl Into<String>,
        attributes: &CookieAttributes,
    ) -> Self {
        let CookieAttributes {
            domain,
            path,
            expires,
            max_age,
            secure,
            http_only,
            same_site,
            priority,
            signed,
        } = attributes.clone();

        Self {
            name: name.into(),
            value: value.into(),
            domain,
            path,
            expires,
            max_age,
            secure,
            http_only,
            same_site,
            priority,
            signed,
        }
    }

    /// Checks the cookie against the rules browsers enforce for `__Secure-` and `__Host-` names.
    ///
    /// Attributes that leave the cookie exposed (no HttpOnly, no Secure, SameSite=None) are logged
    /// as a warning but accepted.
    pub fn check_security(&self) -> Result<(), CookieError> {
        let exposures: Vec<&str> = [
            (!self.http_only, "script-readable"),
            (!self.secure, "sent over plain HTTP"),
            (self.same_site == Some(SameSite::None), "sent cross-site"),
        ]
        .into_iter()
        .filter_map(|(exposed, what)| exposed.then_some(what))
        .collect();
        if !exposures.is_empty() {
            tracing::warn!(cookie = %self.name, ?exposures, "Cookie attributes leave it exposed");
        }

        let host_only = self.name.starts_with(HOST_PREFIX);
        if !self.secure && (host_only || self.name.starts_with(SECURE_PREFIX)) {
            return Err(CookieError::SecurityViolation(format!(
                "`{}` is rejected by browsers unless marked Secure",
                self.name
            )));
        }
        if host_only {
            if let Some(domain) = &self.domain {
                return Err(CookieError::SecurityViolation(format!(
                    "`{}` is bound to its origin host and cannot carry Domain={domain}",
                    self.name
                )));
            }
            if self.path.as_deref() != Some("/") {
                return Err(CookieError::SecurityViolation(format!(
                    "`{}` must cover the whole site with Path=/, not {}",
                    self.name,
                    self.path.as_deref().unwrap_or("no path")
                )));
            }
        }

        Ok(())
    }
}
