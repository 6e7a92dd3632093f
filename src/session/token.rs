//! Signed session tokens.
//!
//! Tokens are compact HS256 JWS strings:
//! `base64url(header) "." base64url(payload) "." base64url(hmac)`.
//! The MAC is checked before the header or payload is parsed, so nothing
//! from an unverified token is ever trusted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use thiserror::Error;

use crate::clock::Clock;
use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Application-defined claims carried in a session.
pub type Claims = Map<String, Value>;

const ALGORITHM: &str = "HS256";

/// Raised when a codec is built without a signing secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session signing secret is empty")]
pub struct EmptySecret;

/// Verified token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub user: Claims,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

impl SessionToken {
    /// Seconds left before expiry at `now_secs`.
    pub fn remaining_secs(&self, now_secs: u64) -> u64 {
        self.exp.saturating_sub(now_secs)
    }
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, clock: Arc<dyn Clock>) -> Result<Self, EmptySecret> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| EmptySecret)?;
        Ok(Self { mac, clock })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue a token for `claims` valid for `lifetime` from now.
    pub fn encode(&self, claims: &Claims, lifetime: Duration) -> String {
        let iat = self.clock.now_secs();
        let exp = iat.saturating_add(lifetime.as_secs());
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": ALGORITHM, "typ": "JWT" }).to_string());
        let payload = URL_SAFE_NO_PAD.encode(
            json!({ "user": claims, "iat": iat, "exp": exp }).to_string(),
        );

        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        format!("{signing_input}.{signature}")
    }

    /// Verify a token and return its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token).map(|session| session.user)
    }

    /// Verify a token and return the full payload, timestamps included.
    pub fn verify(&self, token: &str) -> Result<SessionToken, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Invalid);
        }
        let session: SessionToken = decode_segment(payload)?;

        if self.clock.now_secs() >= session.exp {
            return Err(TokenError::Expired);
        }
        Ok(session)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}
