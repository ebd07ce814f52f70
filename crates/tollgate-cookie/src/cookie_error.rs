/// Errors that can occur while reading or writing cookies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieError {
    /// A cookie header entry has no name
    #[error("Cookie name must not be empty")]
    EmptyKey,

    /// Cookie name contains characters not allowed in a `Set-Cookie` header
    #[error("Invalid cookie name: {0}")]
    InvalidName(String),

    /// Cookie violates security policy (e.g., `__Host-` prefix without Secure)
    #[error("Cookie security policy violation: {0}")]
    SecurityViolation(String),
}
