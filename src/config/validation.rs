//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, pool size, token bucket parameters)
//! - Require credentials the admission gate cannot run without
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{RuntimeMode, ServiceConfig};

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `admission.api_key`.
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

const SSL_MODES: &[&str] = &["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("listener.bind_address", "must not be empty"));
    }

    let db = &config.database;
    if db.host.trim().is_empty() {
        errors.push(ValidationError::new("database.host", "must not be empty"));
    }
    if db.name.trim().is_empty() {
        errors.push(ValidationError::new("database.name", "must not be empty"));
    }
    if db.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be at least 1"));
    }
    if !SSL_MODES.contains(&db.ssl_mode.as_str()) {
        errors.push(ValidationError::new(
            "database.ssl_mode",
            format!("unknown mode '{}'", db.ssl_mode),
        ));
    }

    let admission = &config.admission;
    if admission.enabled {
        if admission.api_key.trim().is_empty() {
            errors.push(ValidationError::new(
                "admission.api_key",
                "required when the admission gate is enabled",
            ));
        }
        if let Err(e) = url::Url::parse(&admission.endpoint) {
            errors.push(ValidationError::new(
                "admission.endpoint",
                format!("invalid URL '{}': {}", admission.endpoint, e),
            ));
        }
        if admission.timeout_ms == 0 {
            errors.push(ValidationError::new("admission.timeout_ms", "must be greater than 0"));
        }
        if admission.requested == 0 {
            errors.push(ValidationError::new("admission.requested", "must be greater than 0"));
        }

        let bucket = &admission.rate_limit;
        if bucket.capacity == 0 {
            errors.push(ValidationError::new("admission.rate_limit.capacity", "must be greater than 0"));
        }
        if bucket.refill_rate == 0 {
            errors.push(ValidationError::new("admission.rate_limit.refill_rate", "must be greater than 0"));
        }
        if bucket.interval_secs == 0 {
            errors.push(ValidationError::new("admission.rate_limit.interval_secs", "must be greater than 0"));
        }
        if admission.requested > bucket.capacity {
            errors.push(ValidationError::new(
                "admission.requested",
                "exceeds the bucket capacity; every request would be rejected",
            ));
        }
    }

    if config.frontend.mode == RuntimeMode::Production && config.frontend.dist_dir.trim().is_empty() {
        errors.push(ValidationError::new("frontend.dist_dir", "required in production mode"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
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

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.admission.api_key = "key_test".to_string();
        config
    }

    #[test]
    fn test_defaults_with_key_are_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = ServiceConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "admission.api_key");
    }

    #[test]
    fn test_disabled_gate_skips_admission_checks() {
        let mut config = ServiceConfig::default();
        config.admission.enabled = false;
        config.admission.rate_limit.capacity = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.database.host = String::new();
        config.database.ssl_mode = "sometimes".to_string();
        config.admission.rate_limit.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["database.host", "database.ssl_mode", "admission.rate_limit.interval_secs"]
        );
    }
}
