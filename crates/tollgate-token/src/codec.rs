use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tollgate_error::{ConfigError, MIN_KEY_LENGTH};
use zeroize::Zeroizing;

use crate::{
    payload::{AUDIENCE, EXPIRES_AT, ISSUED_AT, ISSUER},
    TokenError, TokenPayload,
};

type HmacSha256 = Hmac<Sha256>;

/// The JSON header placed in front of every token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenHeader {
    /// Signing algorithm
    pub alg: String,
    /// Token type
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Header fields to use instead of the defaults (`HS256`, `JWT`).
///
/// Only the header text changes; tokens are always signed with HMAC-SHA256.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    /// Replacement for `alg`
    pub alg: Option<String>,
    /// Replacement for `typ`
    pub typ: Option<String>,
}

/// Optional settings for a [`TokenCodec`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenCodecOptions {
    /// Overrides for the token header
    pub header: HeaderOverrides,
    /// Lifetime in seconds; adds an `exp` claim to every token when set
    pub expires_in: Option<u64>,
    /// Adds an `iss` claim to every token and requires it on verification
    pub issuer: Option<String>,
    /// Adds an `aud` claim to every token and requires it on verification
    pub audience: Option<String>,
}

/// Issues and verifies HMAC-SHA256 signed compact tokens.
///
/// The codec holds only its key and settings, so a single instance can be shared freely between
/// threads. The key is wiped from memory when the codec is dropped.
#[derive(Clone)]
pub struct TokenCodec {
    key: Zeroizing<Vec<u8>>,
    header: TokenHeader,
    expires_in: Option<u64>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("header", &self.header)
            .field("expires_in", &self.expires_in)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec signing with `key`.
    ///
    /// Fails with [`ConfigError::KeyTooShort`] if the key is shorter than [`MIN_KEY_LENGTH`]
    /// bytes.
    pub fn new(key: impl AsRef<[u8]>, options: TokenCodecOptions) -> Result<Self, ConfigError> {
        let key = key.as_ref();
        if key.len() < MIN_KEY_LENGTH {
            return Err(ConfigError::KeyTooShort {
                min: MIN_KEY_LENGTH,
                actual: key.len(),
            });
        }

        let defaults = TokenHeader::default();
        let header = TokenHeader {
            alg: options.header.alg.unwrap_or(defaults.alg),
            typ: options.header.typ.unwrap_or(defaults.typ),
        };

        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
            header,
            expires_in: options.expires_in,
            issuer: options.issuer,
            audience: options.audience,
        })
    }

    /// The header included in every token issued by this codec.
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// Issues a token for `payload`, stamped with the current time.
    pub fn generate<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, TokenError> {
        self.generate_at(payload, Utc::now())
    }

    /// Issues a token for `payload`, stamped with `now`.
    ///
    /// The payload must serialize to a JSON object. Reserved claims (`iat` and, when configured,
    /// `exp`, `iss`, `aud`) replace any caller-supplied claims with the same names.
    pub fn generate_at<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let mut claims = match serde_json::to_value(payload) {
            Ok(Value::Object(claims)) => claims,
            Ok(other) => {
                return Err(TokenError::EncodingFailed(format!(
                    "payload must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(TokenError::EncodingFailed(e.to_string())),
        };
        self.stamp_reserved_claims(&mut claims, now.timestamp());

        let header = encode_segment(&self.header)?;
        let payload = encode_segment(&claims)?;
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&header, &payload));

        Ok(format!("{header}.{payload}.{signature}"))
    }

    /// Verifies `token` against the current time.
    ///
    /// Returns the payload if the token is well formed, correctly signed, unexpired and carries
    /// the configured issuer and audience. Every failure is reported as `None`.
    pub fn verify(&self, token: &str) -> Option<TokenPayload> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<TokenPayload> {
        match self.verify_detailed(token, now) {
            Ok(payload) => Some(payload),
            Err(reason) => {
                tracing::debug!(%reason, "Rejected token");
                None
            }
        }
    }

    pub(crate) fn verify_detailed(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPayload, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed);
        }

        let expected = self.sign(header, payload);
        let received = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::SignatureInvalid)?;
        if received.len() != expected.len()
            || !bool::from(received.as_slice().ct_eq(expected.as_slice()))
        {
            return Err(TokenError::SignatureInvalid);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let payload: TokenPayload = serde_json::from_slice::<Map<String, Value>>(&payload)
            .map_err(|_| TokenError::Malformed)?
            .into();

        if let Some(exp) = payload.get(EXPIRES_AT) {
            let exp = exp.as_i64().ok_or(TokenError::Malformed)?;
            if now.timestamp_millis() >= exp.saturating_mul(1000) {
                return Err(TokenError::Expired);
            }
        }

        if let Some(issuer) = &self.issuer {
            if payload.iss() != Some(issuer.as_str()) {
                return Err(TokenError::IssuerMismatch);
            }
        }

        if let Some(audience) = &self.audience {
            if payload.aud() != Some(audience.as_str()) {
                return Err(TokenError::AudienceMismatch);
            }
        }

        Ok(payload)
    }

    fn stamp_reserved_claims(&self, claims: &mut Map<String, Value>, now: i64) {
        claims.insert(ISSUED_AT.to_string(), now.into());
        if let Some(expires_in) = self.expires_in {
            let expires_in = i64::try_from(expires_in).unwrap_or(i64::MAX);
            claims.insert(EXPIRES_AT.to_string(), now.saturating_add(expires_in).into());
        }
        if let Some(issuer) = &self.issuer {
            claims.insert(ISSUER.to_string(), issuer.clone().into());
        }
        if let Some(audience) = &self.audience {
            claims.insert(AUDIENCE.to_string(), audience.clone().into());
        }
    }

    fn sign(&self, header: &str, payload: &str) -> [u8; 32] {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length");
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());

        let mut signature = [0u8; 32];
        signature.copy_from_slice(&mac.finalize().into_bytes());
        signature
    }
}

fn encode_segment<T: Serialize + ?Sized>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::EncodingFailed(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
