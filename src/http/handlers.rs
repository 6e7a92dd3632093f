//! Authentication endpoints served behind the gate.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::GateError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::session::{cookie, Claims, CurrentUser, MaybeUser};

/// Claim holding the provider's access credential.
pub const ACCESS_TOKEN_CLAIM: &str = "access_token";
pub const REFRESH_TOKEN_CLAIM: &str = "refresh_token";

/// Cookie binding an authorization `state` to the browser that asked for it.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_MAX_AGE_SECS: u64 = 600;

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUrl {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionIssued {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatus {
    pub is_authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Me {
    pub access_token: String,
}

pub async fn health() -> &'static str {
    "ok"
}

/// Authorization URL plus a fresh `state`, pinned to the caller by cookie.
pub async fn auth_url(State(state): State<AppState>) -> Result<Response, GateError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let url = state.provider.authorize_url(&nonce).map_err(|e| {
        tracing::warn!(error = %e, "Cannot build authorization URL");
        GateError::BadRequest(e.to_string())
    })?;

    let mut response = Json(AuthUrl {
        url: url.into(),
        state: nonce.clone(),
    })
    .into_response();
    let state_cookie =
        cookie::session_cookie(OAUTH_STATE_COOKIE, &nonce, OAUTH_STATE_MAX_AGE_SECS);
    if let Some(value) = state_cookie {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}

/// The returned `state` must match the one handed out by [`auth_url`].
fn check_state(headers: &HeaderMap, returned: Option<&str>) -> Result<(), GateError> {
    let expected = cookie::find_cookie(headers, OAUTH_STATE_COOKIE);
    match (expected, returned) {
        (Some(expected), Some(returned))
            if bool::from(expected.as_bytes().ct_eq(returned.as_bytes())) =>
        {
            Ok(())
        }
        _ => {
            tracing::warn!(
                cookie_present = expected.is_some(),
                state_present = returned.is_some(),
                "Authorization state mismatch"
            );
            Err(GateError::BadRequest("Authorization state mismatch".into()))
        }
    }
}

/// Complete the handshake: exchange the code and start a session.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Result<Response, GateError> {
    check_state(&headers, params.state.as_deref())?;

    let grant = state.provider.exchange(&params.code).await.map_err(|e| {
        tracing::warn!(error = %e, "Authorization code exchange failed");
        GateError::BadRequest(format!("Failed to get access token: {e}"))
    })?;

    let mut claims = Claims::new();
    claims.insert(
        ACCESS_TOKEN_CLAIM.into(),
        Value::String(grant.access_token.clone()),
    );
    if let Some(refresh) = &grant.refresh_token {
        claims.insert(REFRESH_TOKEN_CLAIM.into(), Value::String(refresh.clone()));
    }

    let mut response = Json(SessionIssued {
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        expires_in: grant.expires_in,
    })
    .into_response();
    if let Some(value) = cookie::expired_cookie(OAUTH_STATE_COOKIE) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    state.sessions.issue(response.headers_mut(), &claims);
    metrics::record_session_issued();
    tracing::info!("Session issued");

    Ok(response)
}

pub async fn check(MaybeUser(user): MaybeUser) -> Json<AuthStatus> {
    Json(AuthStatus {
        is_authenticated: user.is_some(),
    })
}

pub async fn me(CurrentUser(claims): CurrentUser) -> Result<Json<Me>, GateError> {
    let access_token = claims
        .get(ACCESS_TOKEN_CLAIM)
        .and_then(Value::as_str)
        .ok_or(GateError::Unauthenticated)?;

    Ok(Json(Me {
        access_token: access_token.to_string(),
    }))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    state.sessions.revoke(response.headers_mut());
    response
}
