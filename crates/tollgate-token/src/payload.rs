use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const ISSUED_AT: &str = "iat";
pub(crate) const EXPIRES_AT: &str = "exp";
pub(crate) const ISSUER: &str = "iss";
pub(crate) const AUDIENCE: &str = "aud";

/// The claims carried by a token.
///
/// An open JSON object. The reserved claims `iat`, `exp`, `iss` and `aud` are managed by
/// [`crate::TokenCodec`] and have typed accessors; everything else belongs to the application.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct TokenPayload(Map<String, Value>);

impl TokenPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns the value of a claim.
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// Sets a claim, returning the previous value if there was one.
    pub fn insert(&mut self, claim: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(claim.into(), value.into())
    }

    /// Removes a claim.
    pub fn remove(&mut self, claim: &str) -> Option<Value> {
        self.0.remove(claim)
    }

    /// Issued-at time in Unix seconds.
    pub fn iat(&self) -> Option<i64> {
        self.get(ISSUED_AT).and_then(Value::as_i64)
    }

    /// Expiry time in Unix seconds.
    pub fn exp(&self) -> Option<i64> {
        self.get(EXPIRES_AT).and_then(Value::as_i64)
    }

    /// Issuer, when it is a string.
    pub fn iss(&self) -> Option<&str> {
        self.get(ISSUER).and_then(Value::as_str)
    }

    /// Audience, when it is a string.
    pub fn aud(&self) -> Option<&str> {
        self.get(AUDIENCE).and_then(Value::as_str)
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload has no claims.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the payload, returning the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TokenPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<TokenPayload> for Value {
    fn from(payload: TokenPayload) -> Self {
        Value::Object(payload.0)
    }
}
