//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → gate.rs
//!         → rate_limit.rs (per-IP sliding window)   ✗ 429 + Retry-After
//!         → csrf.rs (POST to non-exempt path)       ✗ 403
//!         → application handler
//!         → session refresh on the response
//! ```
//!
//! # Design Decisions
//! - Fail closed: rejection stops the request before dispatch
//! - Components are built by the server at startup and shared via Arc
//! - Rate-limit state is in memory and local to this process

pub mod csrf;
pub mod gate;
pub mod rate_limit;

pub use csrf::{CsrfGuard, CSRF_HEADER};
pub use gate::{security_gate, SecurityGate};
pub use rate_limit::RateLimiter;
