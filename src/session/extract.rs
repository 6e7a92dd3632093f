//! Axum extractors for the caller's identity.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::error::GateError;
use crate::session::store::SessionStore;
use crate::session::token::Claims;

/// Claims of an authenticated caller. Rejects with 401 when none resolve,
/// naming an invalid or expired credential when one was presented.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

/// Claims of the caller if any resolve; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Claims>);

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<SessionStore>::from_ref(state);
        store.authenticate(&parts.headers).map(CurrentUser)
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<SessionStore>::from_ref(state);
        Ok(MaybeUser(store.current_user(&parts.headers)))
    }
}
