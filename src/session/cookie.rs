//! Credential extraction and `Set-Cookie` rendering.

use axum::http::{header, HeaderMap, HeaderValue};

/// Attributes every session cookie carries, set or deleted.
const SECURITY_ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=Lax";

/// Bearer credential from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Value of the first non-empty request cookie called `name`.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .find(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session cookie.
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64) -> Option<HeaderValue> {
    HeaderValue::try_from(format!(
        "{name}={token}; Max-Age={max_age_secs}; {SECURITY_ATTRIBUTES}"
    ))
    .ok()
}

/// `Set-Cookie` value that tells the client to drop the session cookie.
pub fn expired_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::try_from(format!(
        "{name}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; {SECURITY_ATTRIBUTES}"
    ))
    .ok()
}

/// Cookie value carried by a `Set-Cookie` header for `name`; empty for a deletion.
pub fn set_cookie_value<'a>(set_cookie: &'a str, name: &str) -> Option<&'a str> {
    let pair = set_cookie.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then_some(value.trim())
}

/// Whether a response already sets (or deletes) the cookie called `name`.
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| set_cookie_value(value, name).is_some())
}
