use crate::error::{ServerError, ServerResult};
use crate::routes::parse_body;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use formfit::{FieldType, RegistryError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Validation response
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// The submitted value, echoed as JSON.
    pub value: Value,
    pub is_valid: bool,
}

/// Check one value against a field type.
///
/// Accepts `{"value": ...}` or the older `{"<type>": ...}` shape, e.g.
/// `POST /validate/email` with `{"email": "a@b.co"}`. A missing, null or
/// empty value is a 400; any other non-string value is simply invalid.
pub async fn validate_value(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let field_type: FieldType = kind.parse().map_err(RegistryError::from)?;

    let body = parse_body(&body)?;
    let value = body
        .get("value")
        .or_else(|| body.get(field_type.as_str()))
        .filter(|v| !is_blank(v))
        .cloned()
        .ok_or_else(|| ServerError::BadRequest(format!("{field_type} value is required")))?;

    let is_valid = match value.as_str() {
        Some(text) => state.registry.validate_value(&kind, text)?,
        None => false,
    };
    Ok(Json(ValidateResponse { value, is_valid }))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
