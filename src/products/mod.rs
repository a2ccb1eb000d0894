//! Product resource.
//!
//! # Data Flow
//! ```text
//! /api/products request (already admitted)
//!     → handlers.rs (validate input, pick the query)
//!     → store.rs (one parameterized statement)
//!     → http::response (JSON envelope / error mapping)
//! ```

pub mod handlers;
pub mod model;
pub mod store;

use axum::{routing::get, Router};

pub use model::{CreateProduct, NewProduct, Product, ProductPatch};
pub use store::{PgProductStore, ProductStore, StoreError};

use self::handlers::*;

/// Routes mounted under `/api/products`.
pub fn routes(store: StoreState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(get_product).put(update_product).delete(delete_product))
        .with_state(store)
}
