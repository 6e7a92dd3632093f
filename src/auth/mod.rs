//! Authorization handshake with the external provider.
//!
//! Sessions are born here: a successful code exchange yields the access
//! credential that becomes the session's claims.

pub mod provider;

pub use provider::{AuthorizationProvider, OAuthClient, ProviderError, TokenGrant};
