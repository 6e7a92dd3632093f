//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: optional file, then process environment,
/// then validation.
pub fn load(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => GateConfig::default(),
    };
    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so callers can supply a fixed map.
pub fn apply_env<F>(config: &mut GateConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SECRET_KEY") {
        config.session.secret = v;
    }
    if let Some(v) = lookup("SESSION_COOKIE_NAME") {
        config.session.cookie_name = v;
    }
    if let Some(v) = lookup("SESSION_MAX_AGE") {
        config.session.lifetime_secs = parse("SESSION_MAX_AGE", v)?;
    }
    if let Some(v) = lookup("SESSION_REFRESH_THRESHOLD") {
        config.session.refresh_threshold_secs = parse("SESSION_REFRESH_THRESHOLD", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT") {
        config.rate_limit.limit = parse("RATE_LIMIT", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_WINDOW") {
        config.rate_limit.window_secs = parse("RATE_LIMIT_WINDOW", v)?;
    }
    if let Some(v) = lookup("CSRF_TOKEN") {
        config.csrf.token = v;
    }
    if let Some(v) = lookup("CSRF_EXEMPT_PATHS") {
        config.csrf.exempt_paths = split_list(&v);
    }
    if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = split_list(&v);
    }
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("SPOTIFY_CLIENT_ID") {
        config.oauth.client_id = v;
    }
    if let Some(v) = lookup("SPOTIFY_CLIENT_SECRET") {
        config.oauth.client_secret = v;
    }
    if let Some(v) = lookup("SPOTIFY_REDIRECT_URI") {
        config.oauth.redirect_uri = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    Ok(())
}

/// Comma-separated list, blanks dropped.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
