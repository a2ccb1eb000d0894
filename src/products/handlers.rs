//! Resource handlers for `/api/products`.
//!
//! Each handler validates its input, issues its query through the
//! [`ProductStore`], and maps the outcome onto the JSON envelope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};

use crate::http::response::{ApiError, ApiResponse};
use crate::observability::metrics;
use crate::products::model::{CreateProduct, PatchError, ProductPatch};
use crate::products::store::{ProductStore, StoreResult};

/// Shared handle to the product store.
pub type StoreState = Arc<dyn ProductStore>;

const NOT_FOUND: &str = "Product not found";

/// Query labels for the two statements an update issues.
const UPDATE_FETCH: &str = "fetching product for update";
const UPDATE_WRITE: &str = "updating product";

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation("Invalid product id"))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(ApiError::from)
}

/// Record the query outcome, then convert a store failure into an API error.
fn track<T>(operation: &'static str, result: StoreResult<T>) -> Result<T, ApiError> {
    metrics::record_query(operation, result.is_ok());
    result.map_err(ApiError::store(operation))
}

/// `GET /api/products`
pub async fn list_products(State(store): State<StoreState>) -> Result<impl IntoResponse, ApiError> {
    let products = track("fetching products", store.list().await)?;
    tracing::debug!(count = products.len(), "Fetched products");
    Ok(ApiResponse::ok(products))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(store): State<StoreState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let product = track("fetching product", store.get(id).await)?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    tracing::debug!(id, "Fetched product");
    Ok(ApiResponse::ok(product))
}

/// `POST /api/products`
pub async fn create_product(
    State(store): State<StoreState>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new = body(payload)?
        .validate()
        .ok_or_else(|| ApiError::validation("Please provide all the required fields"))?;

    let product = track("creating product", store.create(&new).await)?;
    tracing::info!(id = product.id, name = %product.name, "Created product");
    Ok(ApiResponse::created(product))
}

/// `PUT /api/products/{id}`
///
/// Fetches the current row, merges the supplied fields over it, and writes
/// the result back. A row deleted between the two statements yields 404.
pub async fn update_product(
    State(store): State<StoreState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let patch = body(payload)?;

    patch.check().map_err(|e| match e {
        PatchError::Empty => ApiError::validation("Please provide at least one field to update"),
        PatchError::Invalid(message) => ApiError::validation(message),
    })?;

    let existing = track(UPDATE_FETCH, store.get(id).await)?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    let merged = patch.apply(&existing);
    let product = track(UPDATE_WRITE, store.update(id, &merged).await)?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    tracing::info!(id, "Updated product");
    Ok(ApiResponse::ok(product))
}

/// `DELETE /api/products/{id}`
pub async fn delete_product(
    State(store): State<StoreState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let product = track("deleting product", store.delete(id).await)?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    tracing::info!(id, "Deleted product");
    Ok(ApiResponse::ok(product))
}
