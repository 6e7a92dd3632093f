//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address captured via ConnectInfo)
//!     → request.rs (assign x-request-id)
//!     → server.rs (trace, timeout)
//!     → security gate (rate limit, CSRF, session refresh)
//!     → handlers.rs (auth endpoints)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer, StartupError};
