#![doc = include_str!("../README.md")]

/// Cookie data model and security validation.
pub mod cookie;
/// Cookie error types.
pub mod cookie_error;
mod codec;

pub use codec::{build_removal, parse, serialize};
pub use cookie::{CookieAttributes, CookieRecord, Priority, SameSite};
pub use cookie_error::CookieError;
