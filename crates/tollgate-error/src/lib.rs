#![doc = include_str!("../README.md")]

use thiserror::Error;

/// Minimum length, in bytes, of a token signing key.
pub const MIN_KEY_LENGTH: usize = 32;

/// Errors raised while constructing a component from its configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The signing key is shorter than [`MIN_KEY_LENGTH`].
    #[error("Signing key must be at least {min} bytes long (got {actual})")]
    KeyTooShort {
        /// Required minimum length
        min: usize,
        /// Length of the rejected key
        actual: usize,
    },

    /// A session store backend with this name is already registered.
    #[error("Session store backend `{0}` is already registered")]
    DuplicateBackend(String),

    /// No session store backend is registered under this name.
    #[error("Unknown session store backend `{0}`")]
    UnknownBackend(String),

    /// The configured session cookie name cannot be used in a `Set-Cookie` header.
    #[error("Invalid session cookie name `{0}`")]
    InvalidCookieName(String),

    /// The session cookie attributes break the rules of the cookie name's prefix.
    #[error("Insecure session cookie attributes: {0}")]
    InsecureCookie(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ConfigError::KeyTooShort {
            min: MIN_KEY_LENGTH,
            actual: 31,
        };
        assert_eq!(
            err.to_string(),
            "Signing key must be at least 32 bytes long (got 31)"
        );

        let err = ConfigError::UnknownBackend("redis".to_string());
        assert_eq!(err.to_string(), "Unknown session store backend `redis`");

        let err = ConfigError::DuplicateBackend("memory".to_string());
        assert_eq!(
            err.to_string(),
            "Session store backend `memory` is already registered"
        );
    }
}
