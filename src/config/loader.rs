//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{LogFormat, RuntimeMode, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Environment error: {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ServiceConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay recognized environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests can supply a fixed map.
pub fn apply_env<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("PGHOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("PGPORT") {
        config.database.port = parse_port("PGPORT", &port)?;
    }
    if let Some(name) = lookup("PGDATABASE") {
        config.database.name = name;
    }
    if let Some(user) = lookup("PGUSER") {
        config.database.user = user;
    }
    if let Some(password) = lookup("PGPASSWORD") {
        config.database.password = password;
    }
    if let Some(ssl_mode) = lookup("PGSSLMODE") {
        config.database.ssl_mode = ssl_mode;
    }

    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_port("PORT", &port)?;
    }

    if let Some(key) = lookup("ADMISSION_API_KEY") {
        config.admission.api_key = key;
    }
    if let Some(endpoint) = lookup("ADMISSION_ENDPOINT") {
        config.admission.endpoint = endpoint;
    }

    // APP_ENV wins over NODE_ENV when both are set.
    if let Some(mode) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
        config.frontend.mode = RuntimeMode::from_env_value(&mode);
    }

    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Env {
                    var: "LOG_FORMAT",
                    message: format!("expected 'json' or 'pretty', got '{}'", other),
                })
            }
        };
    }

    Ok(())
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        message: format!("'{}' is not a valid port", value),
    })
}
