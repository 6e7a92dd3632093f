//! CSRF gate.
//!
//! A static shared secret, not a per-session nonce: every state-mutating
//! request outside the exemption set must echo it in `X-CSRF-Token`.

use std::collections::HashSet;

use axum::http::{HeaderMap, Method};
use subtle::ConstantTimeEq;

use crate::config::CsrfConfig;
use crate::error::GateError;

pub const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Clone)]
pub struct CsrfGuard {
    expected: String,
    exempt_paths: HashSet<String>,
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("exempt_paths", &self.exempt_paths)
            .finish_non_exhaustive()
    }
}

impl CsrfGuard {
    pub fn new<I, P>(expected: impl Into<String>, exempt_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            expected: expected.into(),
            exempt_paths: exempt_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &CsrfConfig) -> Self {
        Self::new(config.token.clone(), config.exempt_paths.iter().cloned())
    }

    /// Only POSTs to non-exempt paths are checked.
    pub fn applies_to(&self, method: &Method, path: &str) -> bool {
        *method == Method::POST && !self.exempt_paths.contains(path)
    }

    pub fn check(&self, method: &Method, path: &str, headers: &HeaderMap) -> Result<(), GateError> {
        if !self.applies_to(method, path) {
            return Ok(());
        }

        let supplied = headers
            .get(CSRF_HEADER)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        // an unset secret rejects everything rather than matching an empty header
        let matches = !self.expected.is_empty()
            && bool::from(supplied.ct_eq(self.expected.as_bytes()));
        if matches {
            Ok(())
        } else {
            Err(GateError::CsrfRejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard() -> CsrfGuard {
        CsrfGuard::new("s3cret", ["/api/auth/callback"])
    }

    fn with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn post_without_header_is_rejected() {
        let err = guard()
            .check(&Method::POST, "/api/things", &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, GateError::CsrfRejected));
    }

    #[test]
    fn post_with_wrong_header_is_rejected() {
        assert!(guard()
            .check(&Method::POST, "/api/things", &with_token("s3cre"))
            .is_err());
        assert!(guard()
            .check(&Method::POST, "/api/things", &with_token("s3cret!"))
            .is_err());
    }

    #[test]
    fn post_with_matching_header_passes() {
        assert!(guard()
            .check(&Method::POST, "/api/things", &with_token("s3cret"))
            .is_ok());
    }

    #[test]
    fn exempt_path_skips_check() {
        assert!(guard()
            .check(&Method::POST, "/api/auth/callback", &HeaderMap::new())
            .is_ok());
        // exemption is exact, not a prefix
        assert!(guard()
            .check(&Method::POST, "/api/auth/callback/x", &HeaderMap::new())
            .is_err());
    }

    #[test]
    fn non_post_methods_are_not_checked() {
        for method in [Method::GET, Method::HEAD, Method::PUT, Method::DELETE] {
            assert!(guard().check(&method, "/api/things", &HeaderMap::new()).is_ok());
        }
    }

    #[test]
    fn unset_secret_rejects_empty_header() {
        let guard = CsrfGuard::new("", Vec::<String>::new());
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static(""));
        assert!(guard.check(&Method::POST, "/x", &headers).is_err());
    }
}
