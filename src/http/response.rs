//! Response envelopes and error mapping.
//!
//! # Responsibilities
//! - Wrap handler results in `{success, data}` / `{success, message}`
//! - Map handler failures to status codes
//! - Log infrastructure failures with full detail server-side
//!
//! # Design Decisions
//! - Clients only ever see the error's message text
//! - Admission rejections use their own `{error}` body (see `security::gate`)

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::products::store::StoreError;

/// Successful envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status(status: StatusCode, data: T) -> (StatusCode, Json<Self>) {
        (status, Json(Self { success: true, data }))
    }
}

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// Failures a resource handler can end with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid input.
    #[error("{0}")]
    Validation(String),

    /// Request body could not be read or decoded as JSON. Always 400,
    /// whatever status axum would pick for the rejection.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),

    #[error("{0}")]
    NotFound(&'static str),

    /// Query failure; `operation` names what was being attempted for the log.
    #[error("{source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Store { operation, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store { operation, source } = &self {
            tracing::error!(operation, error = ?source, "Error {}", operation);
        }

        let status = self.status();
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
