use std::fmt;

use serde::Deserialize;
use tollgate_error::ConfigError;
use zeroize::Zeroizing;

use crate::{HeaderOverrides, TokenCodec, TokenCodecOptions};

/// Token settings as loaded from a configuration file.
///
/// ```
/// # use tollgate_token::TokenCodecConfig;
/// let config: TokenCodecConfig = serde_json::from_str(r#"{
///     "key": "0123456789abcdef0123456789abcdef",
///     "expiresIn": 3600,
///     "issuer": "myapp"
/// }"#).unwrap();
/// let codec = config.build().unwrap();
/// ```
#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenCodecConfig {
    /// Signing key, at least 32 bytes
    pub key: Zeroizing<String>,
    /// Replacement for the `alg` header field
    #[serde(default)]
    pub alg: Option<String>,
    /// Replacement for the `typ` header field
    #[serde(default)]
    pub typ: Option<String>,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Required issuer
    #[serde(default)]
    pub issuer: Option<String>,
    /// Required audience
    #[serde(default)]
    pub audience: Option<String>,
}

impl fmt::Debug for TokenCodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodecConfig")
            .field("key", &"********")
            .field("alg", &self.alg)
            .field("typ", &self.typ)
            .field("expires_in", &self.expires_in)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl TokenCodecConfig {
    /// Builds a [`TokenCodec`] from these settings.
    pub fn build(&self) -> Result<TokenCodec, ConfigError> {
        TokenCodec::from_config(self)
    }
}

impl TokenCodec {
    /// Creates a codec from deserialized settings.
    pub fn from_config(config: &TokenCodecConfig) -> Result<Self, ConfigError> {
        TokenCodec::new(
            config.key.as_bytes(),
            TokenCodecOptions {
                header: HeaderOverrides {
                    alg: config.alg.clone(),
                    typ: config.typ.clone(),
                },
                expires_in: config.expires_in,
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
            },
        )
    }
}
