//! Request gating for web APIs: signed stateless sessions, per-client
//! sliding-window rate limiting and CSRF protection.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod session;

pub use config::GateConfig;
pub use error::{GateError, TokenError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
