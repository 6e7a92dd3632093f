//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment variables (.env honoured) override file values
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → handed to HttpServer, which builds the gate components
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - A missing signing secret fails startup, never a request
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::{
    CorsConfig, CsrfConfig, GateConfig, ListenerConfig, OAuthConfig, ObservabilityConfig, RateLimitConfig,
    SessionConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
