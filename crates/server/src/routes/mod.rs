//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `templates`: Template creation, listing, index inspection, clearing
//! - `matching`: Form matching and match explanations
//! - `validate`: Single-value type validation

pub mod health;
pub mod matching;
pub mod templates;
pub mod validate;

use crate::error::{ServerError, ServerResult};
use axum::body::Bytes;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

/// API version and base info
///
/// Returns server information including version and available endpoints.
///
/// # Response
///
/// ```json
/// {
///   "name": "formfit server",
///   "version": "0.1.0",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "formfit server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/create_template",
            "/templates",
            "/indexes",
            "/get_form",
            "/explain_form",
            "/clear_db",
            "/validate/{type}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Parse a request body as JSON. An empty body is `null`, so handlers can
/// report it with their own "missing" message.
pub(crate) fn parse_body(body: &Bytes) -> ServerResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}
