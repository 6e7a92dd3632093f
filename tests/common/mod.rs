//! Shared utilities for integration testing.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use session_gate::auth::{AuthorizationProvider, ProviderError, TokenGrant};
use session_gate::clock::SystemClock;
use session_gate::{GateConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub const CSRF_TOKEN: &str = "integration-csrf";

/// Provider that accepts the code `"valid-code"` and nothing else.
pub struct FakeProvider;

impl AuthorizationProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> Result<Url, ProviderError> {
        Ok(Url::parse_with_params(
            "https://provider.test/authorize",
            &[("state", state)],
        )?)
    }

    fn exchange<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<TokenGrant, ProviderError>> {
        Box::pin(async move {
            match code {
                "valid-code" => Ok(TokenGrant {
                    access_token: "upstream-access".into(),
                    refresh_token: Some("upstream-refresh".into()),
                    expires_in: 3600,
                }),
                _ => Err(ProviderError::Rejected(400)),
            }
        })
    }
}

pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.session.secret = "integration-secret".into();
    config.csrf.token = CSRF_TOKEN.into();
    config
}

/// A gate server bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(config: GateConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer::with_parts(
            config,
            Arc::new(SystemClock::new()),
            Arc::new(FakeProvider),
        )
        .unwrap();

        let shutdown = Shutdown::new();
        let run_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            server.run(listener, &run_shutdown).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap();
    }
}

/// HTTP client that ignores proxy environment settings.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
