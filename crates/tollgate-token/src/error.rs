use thiserror::Error;

/// Reasons a token could not be issued or accepted.
///
/// Only [`TokenError::EncodingFailed`] is ever returned to callers. The remaining variants are
/// used for diagnostics inside [`crate::TokenCodec::verify`], which reports every rejection the
/// same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not have three non-empty segments or its payload is not a JSON object.
    #[error("Malformed token")]
    Malformed,

    /// The signature does not match the header and payload.
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// The `exp` claim is at or before the current time.
    #[error("Token has expired")]
    Expired,

    /// The `iss` claim does not match the configured issuer.
    #[error("Token issuer mismatch")]
    IssuerMismatch,

    /// The `aud` claim does not match the configured audience.
    #[error("Token audience mismatch")]
    AudienceMismatch,

    /// The payload could not be encoded as a JSON object.
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),
}
