//! Static frontend serving (production only).
//!
//! Files come from the prebuilt bundle directory. Any other non-API path
//! falls back to the bundle's `index.html` so client-side routes resolve.
//! Unknown `/api/*` paths get a JSON 404 instead of the document.

use std::path::PathBuf;

use axum::{http::StatusCode, response::IntoResponse, routing::any, Json, Router};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::FrontendConfig;
use crate::http::response::ErrorBody;

/// Attach the bundle and SPA fallback to `router`.
pub fn mount(router: Router, config: &FrontendConfig) -> Router {
    let dist = PathBuf::from(&config.dist_dir);
    let index = dist.join("index.html");

    tracing::info!(dist_dir = %dist.display(), "Serving frontend bundle");

    router
        .route("/api", any(api_not_found))
        .route("/api/{*rest}", any(api_not_found))
        .fallback_service(ServeDir::new(dist).fallback(ServeFile::new(index)))
}

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            message: "Not found".to_string(),
        }),
    )
}
