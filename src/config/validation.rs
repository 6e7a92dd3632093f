//! Configuration validation.
//!
//! Serde handles syntax; this checks the values the gate relies on. All
//! problems are collected so an operator sees every one in a single run.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::GateConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration before it is accepted into the system.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.session.secret.is_empty() {
        errors.push(ValidationError::new(
            "session.secret",
            "signing secret must be set (SECRET_KEY)",
        ));
    }
    if config.session.cookie_name.is_empty()
        || config
            .session
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '='))
    {
        errors.push(ValidationError::new(
            "session.cookie_name",
            "must be a non-empty cookie token",
        ));
    }
    if config.session.lifetime_secs == 0 {
        errors.push(ValidationError::new("session.lifetime_secs", "must be positive"));
    }
    if config.session.refresh_threshold_secs >= config.session.lifetime_secs {
        errors.push(ValidationError::new(
            "session.refresh_threshold_secs",
            "must be below session.lifetime_secs",
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be positive"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be positive",
        ));
    }

    for origin in &config.cors.allowed_origins {
        // credentialed CORS cannot answer with a wildcard
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("not a usable origin: {origin}"),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be positive"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GateConfig {
        let mut config = GateConfig::default();
        config.session.secret = "test-secret".into();
        config
    }

    #[test]
    fn accepts_defaults_with_secret() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn missing_secret_is_fatal() {
        let errors = validate_config(&GateConfig::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "session.secret"));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid();
        config.rate_limit.window_secs = 0;
        config.session.lifetime_secs = 0;
        config.listener.bind_address = "nowhere".into();
        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert!(fields.contains(&"rate_limit.window_secs"));
        assert!(fields.contains(&"session.lifetime_secs"));
        assert!(fields.contains(&"session.refresh_threshold_secs"));
        assert!(fields.contains(&"listener.bind_address"));
    }

    #[test]
    fn zero_limit_is_allowed() {
        let mut config = valid();
        config.rate_limit.limit = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_wildcard_origin() {
        let mut config = valid();
        config.cors.allowed_origins = vec!["*".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "cors.allowed_origins");
    }

    #[test]
    fn rejects_cookie_name_with_separator() {
        let mut config = valid();
        config.session.cookie_name = "bad;name".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "session.cookie_name");
    }
}
