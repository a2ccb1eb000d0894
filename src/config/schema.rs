//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Postgres connection settings.
    pub database: DatabaseConfig,

    /// Admission gate and policy-engine settings.
    pub admission: AdmissionConfig,

    /// Static frontend serving.
    pub frontend: FrontendConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Postgres connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,

    /// libpq-style ssl mode (disable, allow, prefer, require, verify-ca, verify-full).
    pub ssl_mode: String,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing the query.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: "require".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

/// Whether a rule blocks or only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleMode {
    #[default]
    Live,
    DryRun,
}

/// Admission gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// When false every request passes straight to the handlers.
    pub enabled: bool,

    /// Base URL of the policy-decision service.
    pub endpoint: String,

    /// API key presented to the policy-decision service.
    pub api_key: String,

    /// HTTP timeout for one decision call, in milliseconds.
    pub timeout_ms: u64,

    /// Tokens consumed per request.
    pub requested: u32,

    /// Number of reverse proxies in front of the service whose
    /// `X-Forwarded-For` entries are trusted.
    pub trust_proxy_hops: usize,

    pub shield: ShieldRuleConfig,
    pub bot: BotRuleConfig,
    pub rate_limit: TokenBucketConfig,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://decide.example.net".to_string(),
            api_key: String::new(),
            timeout_ms: 1000,
            requested: 1,
            trust_proxy_hops: 1,
            shield: ShieldRuleConfig::default(),
            bot: BotRuleConfig::default(),
            rate_limit: TokenBucketConfig::default(),
        }
    }
}

/// Attack-signature shield.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShieldRuleConfig {
    pub mode: RuleMode,
}

/// Bot detection with an allow list of categories or named bots.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotRuleConfig {
    pub mode: RuleMode,
    pub allow: Vec<String>,
}

impl Default for BotRuleConfig {
    fn default() -> Self {
        Self {
            mode: RuleMode::Live,
            allow: vec!["CATEGORY:SEARCH_ENGINE".to_string()],
        }
    }
}

/// Token bucket keyed by source IP.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenBucketConfig {
    pub mode: RuleMode,

    /// Tokens added every `interval_secs`.
    pub refill_rate: u32,

    pub interval_secs: u32,

    /// Maximum tokens a bucket can hold.
    pub capacity: u32,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            mode: RuleMode::Live,
            refill_rate: 30,
            interval_secs: 10,
            capacity: 20,
        }
    }
}

/// Runtime mode. Only production serves the bundled frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    /// Interpret an `APP_ENV` / `NODE_ENV` value.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            RuntimeMode::Production
        } else {
            RuntimeMode::Development
        }
    }
}

/// Static frontend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub mode: RuntimeMode,

    /// Directory holding the prebuilt bundle and its `index.html`.
    pub dist_dir: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Development,
            dist_dir: "frontend/dist".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
