//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, CORS, body limit)
//!     → security::gate (admission decision)
//!     → products handlers | frontend.rs (production static bundle)
//!     → response.rs (JSON envelope, error mapping)
//!     → security::headers (hardening headers)
//!     → Send to client
//! ```

pub mod frontend;
pub mod request;
pub mod response;
pub mod server;

pub use response::{ApiError, ApiResponse};
pub use server::HttpServer;
