//! Storefront API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 STOREFRONT API                    │
//!                         │                                                   │
//!   Client Request        │  ┌─────────┐   ┌───────────┐   ┌──────────────┐  │
//!   ──────────────────────┼─▶│  http   │──▶│ admission │──▶│   products   │  │
//!                         │  │ server  │   │   gate    │   │   handlers   │  │
//!                         │  └─────────┘   └─────┬─────┘   └──────┬───────┘  │
//!                         │                      │                │          │
//!                         │                      ▼                ▼          │
//!                         │              ┌──────────────┐  ┌─────────────┐   │
//!                         │              │   decision   │  │  Postgres   │   │
//!                         │              │   service    │  │  products   │   │
//!                         │              └──────────────┘  └─────────────┘   │
//!                         │                                                   │
//!                         │  config · observability · lifecycle · frontend    │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use storefront_api::config::load_config;
use storefront_api::http::HttpServer;
use storefront_api::lifecycle::{signals, startup, Shutdown};
use storefront_api::observability::{logging, metrics};
use storefront_api::products::PgProductStore;
use storefront_api::security::RemoteDecisionClient;

#[derive(Parser)]
#[command(name = "storefront-api")]
#[command(about = "Product CRUD service with request admission control", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("storefront-api v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        port = config.listener.port,
        mode = ?config.frontend.mode,
        admission_enabled = config.admission.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(PgProductStore::connect_lazy(&config.database)?);
    let decisions = Arc::new(RemoteDecisionClient::new(&config.admission)?);

    startup::bootstrap_schema(store.as_ref()).await;

    let listener = TcpListener::bind(config.listener.socket_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, store.clone(), decisions);
    server.run(listener, shutdown).await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
