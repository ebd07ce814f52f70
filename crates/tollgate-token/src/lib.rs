#![doc = include_str!("../README.md")]

mod codec;
pub use codec::{HeaderOverrides, TokenCodec, TokenCodecOptions, TokenHeader};
mod config;
pub use config::TokenCodecConfig;
mod error;
pub use error::TokenError;
mod payload;
pub use payload::TokenPayload;

pub use tollgate_error::{ConfigError, MIN_KEY_LENGTH};
