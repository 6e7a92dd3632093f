//! Session gate server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ ┌──────────────────┐
//!                                                       │  security gate   │
//!                                                       │  1. rate limit   │─▶ 429
//!                                                       │  2. CSRF         │─▶ 403
//!                                                       └────────┬─────────┘
//!                                                                ▼
//!                                                       ┌──────────────────┐
//!                                                       │  auth handlers   │
//!                                                       │  (session store) │
//!                                                       └────────┬─────────┘
//!     Client Response                                            ▼
//!     ◀────────────── request id ◀──────────────────── 3. session refresh
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use session_gate::config;
use session_gate::lifecycle::signals::spawn_signal_handler;
use session_gate::observability::{logging, metrics};
use session_gate::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "session-gate")]
#[command(about = "Session, rate-limit and CSRF gate for web APIs", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "session-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        cookie = %config.session.cookie_name,
        lifetime_secs = config.session.lifetime_secs,
        rate_limit = config.rate_limit.limit,
        window_secs = config.rate_limit.window_secs,
        csrf_exempt = config.csrf.exempt_paths.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
