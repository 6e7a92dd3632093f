//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate decisions, session issue/refresh/revoke:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is attached to every rejection log line
//! - Tokens and secrets are never logged

pub mod logging;
pub mod metrics;
