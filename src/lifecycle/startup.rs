//! Startup orchestration.
//!
//! # Responsibilities
//! - Bootstrap the `products` table before traffic is accepted
//!
//! # Design Decisions
//! - Bootstrap failure is logged, not fatal: the listener still starts and
//!   requests report the database error until it recovers

use crate::products::store::ProductStore;

/// Create the schema if absent. Returns whether bootstrap succeeded.
pub async fn bootstrap_schema(store: &dyn ProductStore) -> bool {
    match store.bootstrap().await {
        Ok(()) => {
            tracing::info!("Database initialized successfully");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Database connection error");
            false
        }
    }
}
