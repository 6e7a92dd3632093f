//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the gate components from configuration
//! - Create the Axum router with the auth endpoints
//! - Wire up middleware (request ID, tracing, CORS, timeout, security gate)
//! - Run the rate-limit sweeper alongside the server
//! - Serve until shutdown, then drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthorizationProvider, OAuthClient, ProviderError};
use crate::clock::{Clock, SystemClock};
use crate::config::{CorsConfig, GateConfig};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::{sweeper, Shutdown};
use crate::security::{security_gate, CsrfGuard, RateLimiter, SecurityGate};
use crate::session::{EmptySecret, SessionStore, TokenCodec};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub provider: Arc<dyn AuthorizationProvider>,
}

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Secret(#[from] EmptySecret),

    #[error("authorization provider: {0}")]
    Provider(#[from] ProviderError),
}

/// HTTP server fronted by the security gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<RateLimiter>,
    sessions: Arc<SessionStore>,
}

impl HttpServer {
    /// Create a server using the system clock and the configured OAuth provider.
    pub fn new(config: GateConfig) -> Result<Self, StartupError> {
        let provider = Arc::new(OAuthClient::new(config.oauth.clone())?);
        Self::with_parts(config, Arc::new(SystemClock::new()), provider)
    }

    /// Create a server from explicit collaborators.
    pub fn with_parts(
        config: GateConfig,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn AuthorizationProvider>,
    ) -> Result<Self, StartupError> {
        let codec = TokenCodec::new(&config.session.secret, Arc::clone(&clock))?;
        let sessions = Arc::new(SessionStore::from_config(codec, &config.session));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit, clock));
        let gate = Arc::new(SecurityGate::new(
            Arc::clone(&limiter),
            CsrfGuard::from_config(&config.csrf),
            Arc::clone(&sessions),
            config.session.refresh_threshold_secs,
        ));

        let state = AppState {
            sessions: Arc::clone(&sessions),
            provider,
        };

        let router = build_router(&config, state, gate);
        Ok(Self {
            router,
            config,
            limiter,
            sessions,
        })
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.config.rate_limit.limit,
            window_secs = self.config.rate_limit.window_secs,
            "HTTP server starting"
        );

        let sweeper = sweeper::spawn(
            Arc::clone(&self.limiter),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.subscribe(),
        );

        let mut stop = shutdown.subscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.recv().await })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Rate-limit sweeper ended abnormally");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }
}

/// Credentialed CORS for the configured origins.
///
/// Methods and headers mirror the preflight request, since a wildcard is not
/// allowed alongside credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the Axum router with all middleware layers.
///
/// CORS sits outside the gate so preflights are answered without spending
/// rate-limit slots, and gate rejections still carry CORS headers.
#[allow(deprecated)]
pub fn build_router(config: &GateConfig, state: AppState, gate: Arc<SecurityGate>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/url", get(handlers::auth_url))
        .route("/api/auth/callback", post(handlers::callback))
        .route("/api/auth/check", get(handlers::check))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/logout", post(handlers::logout))
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, security_gate))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}
