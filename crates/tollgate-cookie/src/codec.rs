use std::{collections::HashMap, fmt::Write};

use chrono::{DateTime, Utc};

use crate::{CookieAttributes, CookieError, CookieRecord};

/// IMF-fixdate, the only date format browsers are required to accept in `Expires`.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parses a `Cookie` request header into records keyed by name.
///
/// Entries are separated by `;` and split on their first `=`. Names are trimmed and values are
/// percent-decoded. An entry without `=` produces a cookie whose value is its own name. When a
/// name repeats, the last entry wins.
pub fn parse(header: &str) -> Result<HashMap<String, CookieRecord>, CookieError> {
    let mut cookies = HashMap::new();

    for entry in header.split(';') {
        let (name, raw_value) = match entry.split_once('=') {
            Some((name, value)) => (name.trim(), value),
            None => (entry.trim(), entry.trim()),
        };
        if name.is_empty() {
            return Err(CookieError::EmptyKey);
        }

        let value = urlencoding::decode(raw_value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw_value.to_string());

        cookies.insert(name.to_string(), CookieRecord::new(name, value));
    }

    Ok(cookies)
}

/// Serializes a cookie into a `Set-Cookie` header value.
///
/// Attributes follow `name=value` in the order Domain, Path, Expires, Max-Age, Secure,
/// HttpOnly, SameSite, Priority, Signed. Flags are only written when set.
pub fn serialize(cookie: &CookieRecord) -> Result<String, CookieError> {
    validate_name(&cookie.name)?;

    let mut out = format!("{}={}", cookie.name, urlencoding::encode(&cookie.value));

    // Writing to a String cannot fail
    if let Some(domain) = &cookie.domain {
        let _ = write!(out, "; Domain={domain}");
    }
    if let Some(path) = &cookie.path {
        let _ = write!(out, "; Path={path}");
    }
    if let Some(expires) = &cookie.expires {
        let _ = write!(out, "; Expires={}", http_date(expires));
    }
    if let Some(max_age) = cookie.max_age {
        let _ = write!(out, "; Max-Age={max_age}");
    }
    if cookie.secure {
        out.push_str("; Secure");
    }
    if cookie.http_only {
        out.push_str("; HttpOnly");
    }
    if let Some(same_site) = cookie.same_site {
        let _ = write!(out, "; SameSite={same_site}");
    }
    if let Some(priority) = cookie.priority {
        let _ = write!(out, "; Priority={priority}");
    }
    if cookie.signed {
        out.push_str("; Signed");
    }

    Ok(out)
}

/// Builds a `Set-Cookie` value that deletes the cookie `name`.
///
/// The value is emptied and the expiry is forced into the past regardless of what `attributes`
/// asks for. Domain and Path are kept since the browser only deletes a cookie whose scope
/// matches.
pub fn build_removal(name: &str, attributes: &CookieAttributes) -> Result<String, CookieError> {
    let mut cookie = CookieRecord::with_attributes(name, "", attributes);
    cookie.expires = Some(DateTime::<Utc>::UNIX_EPOCH);
    cookie.max_age = Some(0);

    serialize(&cookie)
}

fn http_date(date: &DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}

fn validate_name(name: &str) -> Result<(), CookieError> {
    if name.is_empty() {
        return Err(CookieError::EmptyKey);
    }

    // RFC 6265 cookie-name is an RFC 2616 token
    let is_token_char = |c: char| {
        c.is_ascii_graphic()
            && !matches!(
                c,
                '(' | ')'
                    | '<'
                    | '>'
                    | '@'
                    | ','
                    | ';'
                    | ':'
                    | '\\'
                    | '"'
                    | '/'
                    | '['
                    | ']'
                    | '?'
                    | '='
                    | '{'
                    | '}'
            )
    };
    if !name.chars().all(is_token_char) {
        return Err(CookieError::InvalidName(name.to_string()));
    }

    Ok(())
}
