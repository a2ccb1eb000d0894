//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the product routes
//! - Wire up middleware (request ID, tracing, CORS, body limit, admission gate)
//! - Serve the frontend bundle in production mode
//! - Bind server to listener and shut down gracefully
//! - Treat `/path/` like `/path`, so `/api/products/` lists products

use axum::{
    body::Body,
    http::{HeaderName, Request},
    middleware::{self, Next},
    response::Response,
    Router, ServiceExt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{RuntimeMode, ServiceConfig};
use crate::http::frontend;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::products::{self, ProductStore};
use crate::security::headers::security_header_layers;
use crate::security::{admission_middleware, AdmissionGate, DecisionService};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// HTTP server for the storefront API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server over the given store and decision service.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn ProductStore>,
        decisions: Arc<dyn DecisionService>,
    ) -> Self {
        let gate = AdmissionGate::new(&config.admission, decisions);
        if !gate.is_enabled() {
            tracing::warn!("Admission gate disabled; all requests pass through");
        }

        let router = Self::build_router(&config, store, gate);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, store: Arc<dyn ProductStore>, gate: AdmissionGate) -> Router {
        let mut router = Router::new().nest("/api/products", products::routes(store));

        if config.frontend.mode == RuntimeMode::Production {
            router = frontend::mount(router, &config.frontend);
        }

        let mut router = router
            .layer(middleware::from_fn_with_state(gate, admission_middleware))
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
            .layer(CorsLayer::permissive());

        for layer in security_header_layers() {
            router = router.layer(layer);
        }

        let request_id = HeaderName::from_static(X_REQUEST_ID);
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(middleware::from_fn(track_metrics)),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = ?self.config.frontend.mode,
            "HTTP server starting"
        );

        // Routing happens inside the router, so the slash must go before it.
        let app = NormalizePathLayer::trim_trailing_slash().layer(self.router);
        let app = ServiceExt::<Request<Body>>::into_make_service_with_connect_info::<SocketAddr>(app);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
