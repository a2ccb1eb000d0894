//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overlay: PG*, PORT, ADMISSION_*, APP_ENV/NODE_ENV
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared by value/Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdmissionConfig, BotRuleConfig, DatabaseConfig, FrontendConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RuleMode, RuntimeMode, ServiceConfig, ShieldRuleConfig, TokenBucketConfig,
};
