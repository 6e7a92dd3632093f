//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files;
//! environment variables are layered on top by the loader.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Signed session settings.
    pub session: SessionConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// CSRF shared secret and exemptions.
    pub csrf: CsrfConfig,

    /// Browser origins allowed to call the API with credentials.
    pub cors: CorsConfig,

    /// External authorization provider.
    pub oauth: OAuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Session token and cookie configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC signing secret. Must be set; startup fails otherwise.
    #[serde(skip_serializing)]
    pub secret: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Token lifetime and cookie Max-Age, in seconds.
    pub lifetime_secs: u64,

    /// Remaining lifetime below which the gate reissues the cookie.
    pub refresh_threshold_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: "session".to_string(),
            lifetime_secs: 1800,
            refresh_threshold_secs: 300,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &redact(&self.secret))
            .field("cookie_name", &self.cookie_name)
            .field("lifetime_secs", &self.lifetime_secs)
            .field("refresh_threshold_secs", &self.refresh_threshold_secs)
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per client within the window. 0 rejects everything.
    pub limit: usize,

    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// How often clients with empty windows are evicted.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window_secs: 60,
            sweep_interval_secs: 60,
        }
    }
}

/// CSRF gate configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Shared secret expected in `X-CSRF-Token`.
    #[serde(skip_serializing)]
    pub token: String,

    /// Exact paths whose POSTs skip the CSRF check.
    pub exempt_paths: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            exempt_paths: [
                "/api/mood/detect",
                "/api/auth/url",
                "/api/auth/callback",
                "/api/auth/check",
                "/api/auth/me",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("token", &redact(&self.token))
            .field("exempt_paths", &self.exempt_paths)
            .finish()
    }
}

/// Cross-origin access for the browser frontend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins (scheme, host and port) answered with credentialed
    /// CORS headers. Empty disables cross-origin access.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5176".to_string()],
        }
    }
}

/// Authorization-code provider settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,

    #[serde(skip_serializing)]
    pub client_secret: String,

    pub redirect_uri: String,

    pub authorize_url: String,

    pub token_url: String,

    /// Space-separated scope list.
    pub scopes: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "https://localhost:5176/auth/callback".to_string(),
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            scopes: "user-library-read user-read-private user-read-email playlist-modify-public"
                .to_string(),
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
