//! External authorization-code provider.
//!
//! The gate only needs two things from the provider: a URL to send the user
//! to, and an exchange of the returned code for an access credential.

use futures_util::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::OAuthConfig;

/// Credential returned by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authorization provider is not configured")]
    NotConfigured,

    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected the authorization code (status {0})")]
    Rejected(u16),
}

/// Collaborator that performs the authorization handshake.
pub trait AuthorizationProvider: Send + Sync {
    /// Where to send the user to grant access.
    fn authorize_url(&self, state: &str) -> Result<Url, ProviderError>;

    /// Trade an authorization code for a credential.
    fn exchange<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant, ProviderError>>;
}

/// OAuth2 authorization-code client (client-secret-basic).
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(ProviderError::NotConfigured);
        }
        Ok(())
    }

    async fn request_token(&self, code: &str) -> Result<TokenGrant, ProviderError> {
        self.ensure_configured()?;

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Token endpoint refused authorization code");
            return Err(ProviderError::Rejected(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

impl AuthorizationProvider for OAuthClient {
    fn authorize_url(&self, state: &str) -> Result<Url, ProviderError> {
        if self.config.client_id.is_empty() {
            return Err(ProviderError::NotConfigured);
        }
        Ok(Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scopes.as_str()),
                ("state", state),
            ],
        )?)
    }

    fn exchange<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant, ProviderError>> {
        Box::pin(self.request_token(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123".into(),
            client_secret: "shh".into(),
            ..OAuthConfig::default()
        }
    }

    #[test]
    fn builds_authorize_url_with_encoded_params() {
        let client = OAuthClient::new(config()).unwrap();
        let url = client.authorize_url("xyz").unwrap();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["redirect_uri"], "https://localhost:5176/auth/callback");
        assert!(params["scope"].contains("user-library-read"));
    }

    #[test]
    fn unconfigured_client_refuses() {
        let client = OAuthClient::new(OAuthConfig::default()).unwrap();
        assert!(matches!(
            client.authorize_url("s"),
            Err(ProviderError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn exchange_without_credentials_fails_fast() {
        let client = OAuthClient::new(OAuthConfig::default()).unwrap();
        assert!(matches!(
            client.exchange("code").await,
            Err(ProviderError::NotConfigured)
        ));
    }

    #[test]
    fn grant_tolerates_missing_optional_fields() {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(grant.refresh_token, None);
        assert_eq!(grant.expires_in, 0);
    }
}
