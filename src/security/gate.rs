//! Security gate middleware.
//!
//! Every request passes, in order:
//! 1. rate check (per peer address)
//! 2. CSRF check (POSTs to non-exempt paths)
//! 3. the downstream handler, untouched
//! 4. opportunistic session refresh on the way out
//!
//! Steps 1 and 2 short-circuit with 429/403. Step 4 never fails the request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::GateError;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::csrf::CsrfGuard;
use crate::security::rate_limit::RateLimiter;
use crate::session::{cookie, SessionStore};

/// Client identifier used when the peer address is not known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The composed gate, shared by every request.
#[derive(Debug)]
pub struct SecurityGate {
    limiter: Arc<RateLimiter>,
    csrf: CsrfGuard,
    sessions: Arc<SessionStore>,
    refresh_threshold_secs: u64,
}

impl SecurityGate {
    pub fn new(
        limiter: Arc<RateLimiter>,
        csrf: CsrfGuard,
        sessions: Arc<SessionStore>,
        refresh_threshold_secs: u64,
    ) -> Self {
        Self {
            limiter,
            csrf,
            sessions,
            refresh_threshold_secs,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Steps 1 and 2: admission and CSRF.
    pub fn check(
        &self,
        client_id: &str,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<(), GateError> {
        if !self.limiter.admit(client_id) {
            metrics::record_rate_limited();
            return Err(GateError::RateLimited {
                retry_after_secs: self.limiter.window().as_secs(),
            });
        }

        self.csrf.check(method, path, headers).inspect_err(|_| {
            metrics::record_csrf_rejected();
        })
    }

    /// Step 4: reissue a soon-to-expire session cookie, or delete one that
    /// no longer verifies. Leaves the response alone if the handler already
    /// set or cleared the cookie itself.
    pub fn refresh_session(&self, request_cookie: Option<&str>, response: &mut HeaderMap) {
        let Some(token) = request_cookie else {
            return;
        };
        if cookie::sets_cookie(response, self.sessions.cookie_name()) {
            return;
        }

        match self.sessions.codec().verify(token) {
            Ok(session) => {
                let remaining = self.sessions.remaining_secs(&session);
                if remaining < self.refresh_threshold_secs {
                    self.sessions.issue(response, &session.user);
                    metrics::record_session_refreshed();
                    debug!(remaining_secs = remaining, "Session cookie refreshed");
                }
            }
            Err(err) => {
                debug!(error = %err, "Clearing unusable session cookie");
                self.sessions.revoke(response);
            }
        }
    }
}

/// Client identifier for rate limiting: the peer IP, or [`UNKNOWN_CLIENT`].
pub fn client_id(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware function wiring [`SecurityGate`] around the router.
pub async fn security_gate(
    State(gate): State<Arc<SecurityGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_id(&request);

    if let Err(err) = gate.check(
        &client,
        request.method(),
        request.uri().path(),
        request.headers(),
    ) {
        warn!(
            request_id = %request_id(request.headers()),
            client = %client,
            method = %request.method(),
            path = %request.uri().path(),
            error = %err,
            "Request rejected by security gate"
        );
        return err.into_response();
    }

    let session_cookie = gate
        .sessions
        .session_cookie(request.headers())
        .map(str::to_owned);

    let mut response = next.run(request).await;
    gate.refresh_session(session_cookie.as_deref(), response.headers_mut());
    response
}
