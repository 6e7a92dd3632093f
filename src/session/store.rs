//! Stateless session store.
//!
//! Identity lives entirely in the signed token; nothing is kept server-side.
//! A token stays valid until its `exp` even after the cookie is deleted.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::GateError;
use crate::observability::metrics;
use crate::session::cookie;
use crate::session::token::{Claims, SessionToken, TokenCodec};

/// Resolves and issues sessions on top of a [`TokenCodec`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    codec: TokenCodec,
    cookie_name: String,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(codec: TokenCodec, cookie_name: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
            lifetime,
        }
    }

    pub fn from_config(codec: TokenCodec, config: &SessionConfig) -> Self {
        Self::new(
            codec,
            config.cookie_name.clone(),
            Duration::from_secs(config.lifetime_secs),
        )
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Raw session cookie carried by a request, if any.
    pub fn session_cookie<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        cookie::find_cookie(headers, &self.cookie_name)
    }

    /// Claims of the caller, from the bearer credential or else the cookie.
    ///
    /// Any decoding failure yields `None`: an unusable credential makes the
    /// caller anonymous, never authenticated.
    pub fn current_user(&self, headers: &HeaderMap) -> Option<Claims> {
        self.authenticate(headers).ok()
    }

    /// Like [`current_user`](Self::current_user), but says why no identity
    /// resolved: `Unauthenticated` when no credential was presented, otherwise
    /// the failure of the first credential tried.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, GateError> {
        let bearer = cookie::bearer_token(headers);
        let from_cookie = self.session_cookie(headers);

        let mut failure = None;
        for token in bearer.into_iter().chain(from_cookie) {
            match self.codec.decode(token) {
                Ok(claims) => return Ok(claims),
                Err(err) => {
                    debug!(error = %err, "Ignoring unusable session credential");
                    failure.get_or_insert(err);
                }
            }
        }
        Err(failure.map_or(GateError::Unauthenticated, GateError::from))
    }

    /// Verified payload of a token, timestamps included.
    pub fn inspect(&self, token: &str) -> Option<SessionToken> {
        self.codec.verify(token).ok()
    }

    /// Seconds before `session` expires, by the codec's clock.
    pub fn remaining_secs(&self, session: &SessionToken) -> u64 {
        session.remaining_secs(self.codec.clock().now_secs())
    }

    /// Encode `claims` into a fresh token and attach it as the session cookie.
    /// Returns the token so callers may also hand it out as a bearer credential.
    pub fn issue(&self, headers: &mut HeaderMap, claims: &Claims) -> String {
        let token = self.codec.encode(claims, self.lifetime);
        match cookie::session_cookie(&self.cookie_name, &token, self.lifetime.as_secs()) {
            Some(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            None => warn!(cookie = %self.cookie_name, "Session cookie not representable as a header"),
        }
        token
    }

    /// Tell the client to delete its session cookie.
    pub fn revoke(&self, headers: &mut HeaderMap) {
        match cookie::expired_cookie(&self.cookie_name) {
            Some(value) => {
                headers.append(header::SET_COOKIE, value);
                metrics::record_session_revoked();
            }
            None => warn!(cookie = %self.cookie_name, "Session cookie not representable as a header"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use axum::http::HeaderValue;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(Duration::from_secs(1_700_000_000)));
        let codec = TokenCodec::new("store-secret", clock.clone()).unwrap();
        (
            SessionStore::new(codec, "session", Duration::from_secs(1800)),
            clock,
        )
    }

    fn claims(token: &str) -> Claims {
        let mut claims = Claims::new();
        claims.insert("access_token".into(), json!(token));
        claims
    }

    fn request(pairs: &[(header::HeaderName, String)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn anonymous_without_credentials() {
        let (store, _) = store();
        assert_eq!(store.current_user(&HeaderMap::new()), None);
    }

    #[test]
    fn resolves_bearer_before_cookie() {
        let (store, _) = store();
        let bearer = store.codec().encode(&claims("from-bearer"), store.lifetime());
        let cookie = store.codec().encode(&claims("from-cookie"), store.lifetime());

        let headers = request(&[
            (header::AUTHORIZATION, format!("Bearer {bearer}")),
            (header::COOKIE, format!("session={cookie}")),
        ]);
        assert_eq!(store.current_user(&headers), Some(claims("from-bearer")));
    }

    #[test]
    fn falls_back_to_cookie_when_bearer_is_unusable() {
        let (store, _) = store();
        let cookie = store.codec().encode(&claims("from-cookie"), store.lifetime());

        let headers = request(&[
            (header::AUTHORIZATION, "Bearer garbage".to_string()),
            (header::COOKIE, format!("session={cookie}")),
        ]);
        assert_eq!(store.current_user(&headers), Some(claims("from-cookie")));
    }

    #[test]
    fn expired_cookie_is_anonymous() {
        let (store, clock) = store();
        let cookie = store.codec().encode(&claims("old"), store.lifetime());
        clock.advance(Duration::from_secs(1800));

        let headers = request(&[(header::COOKIE, format!("session={cookie}"))]);
        assert_eq!(store.current_user(&headers), None);
    }

    #[test]
    fn authenticate_names_the_failure() {
        let (store, clock) = store();
        assert!(matches!(
            store.authenticate(&HeaderMap::new()),
            Err(GateError::Unauthenticated)
        ));

        let headers = request(&[(header::COOKIE, "session=not.a.token".to_string())]);
        assert!(matches!(
            store.authenticate(&headers),
            Err(GateError::InvalidToken)
        ));

        let token = store.codec().encode(&claims("old"), store.lifetime());
        clock.advance(Duration::from_secs(1800));
        let headers = request(&[
            (header::AUTHORIZATION, format!("Bearer {token}")),
            (header::COOKIE, "session=not.a.token".to_string()),
        ]);
        assert!(matches!(
            store.authenticate(&headers),
            Err(GateError::ExpiredToken)
        ));
    }

    #[test]
    fn issue_sets_cookie_that_resolves() {
        let (store, _) = store();
        let mut response = HeaderMap::new();
        let token = store.issue(&mut response, &claims("abc"));

        let set_cookie = response[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("session={token};")));
        assert!(set_cookie.contains("Max-Age=1800"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));

        let next = request(&[(header::COOKIE, format!("session={token}"))]);
        assert_eq!(store.current_user(&next), Some(claims("abc")));
    }

    #[test]
    fn revoke_deletes_cookie() {
        let (store, _) = store();
        let mut response = HeaderMap::new();
        store.revoke(&mut response);

        let set_cookie = response[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
        assert!(set_cookie.contains("Path=/"));
    }

    #[test]
    fn reports_remaining_lifetime() {
        let (store, clock) = store();
        let token = store.codec().encode(&claims("abc"), store.lifetime());
        clock.advance(Duration::from_secs(1700));

        let session = store.inspect(&token).unwrap();
        assert_eq!(store.remaining_secs(&session), 100);
    }
}
