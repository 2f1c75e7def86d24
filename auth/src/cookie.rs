//! Session cookie handling.
//!
//! The session token travels in an `HttpOnly`, `SameSite=Strict` cookie named
//! [`SESSION_COOKIE`]. Non-browser clients may send it as an
//! `Authorization: Bearer` header instead.

use crate::config::AuthConfig;
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "token";

/// `Set-Cookie` value that stores `token` for the configured session lifetime.
#[must_use]
pub fn session_cookie(token: &str, config: &AuthConfig) -> String {
    build(token, config.session_ttl.num_seconds(), config.cookie_secure)
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie(config: &AuthConfig) -> String {
    build("", 0, config.cookie_secure)
}

fn build(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Find the session token in a `Cookie` header value.
///
/// ```
/// use eventbook_auth::cookie::token_from_cookie_header;
///
/// assert_eq!(token_from_cookie_header("theme=dark; token=abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(token_from_cookie_header("theme=dark"), None);
/// ```
#[must_use]
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Session token from the `Cookie` header, if any.
#[must_use]
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)
        .map(str::to_string)
}

/// Session token from an `Authorization: Bearer` header, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Candidate session tokens in the order they should be tried.
///
/// The cookie comes first. A bearer token is still returned alongside it, so
/// a stale cookie left in a browser does not shadow a valid header.
#[must_use]
pub fn extract_tokens(headers: &HeaderMap) -> Vec<String> {
    cookie_token(headers)
        .into_iter()
        .chain(bearer_token(headers))
        .collect()
}
