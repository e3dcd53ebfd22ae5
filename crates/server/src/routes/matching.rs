use crate::error::ServerResult;
use crate::routes::parse_body;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formfit::MatchResult;
use serde_json::json;
use std::sync::Arc;

/// Match a submitted form against stored templates.
///
/// - 200 `{"matching_template_name": <name>}` when a template matches.
/// - 404 with the inferred `{field: type}` map when none does.
/// - 400 when the body is empty or not an object.
pub async fn get_form(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<Response> {
    let body = parse_body(&body)?;
    let response = match state.registry.match_json(&body)? {
        MatchResult::Matched {
            template_id,
            template_name,
        } => {
            tracing::debug!(template_id = %template_id, "form matched");
            (
                StatusCode::OK,
                Json(json!({ "matching_template_name": template_name })),
            )
                .into_response()
        }
        MatchResult::Unmatched { inferred_form } => {
            (StatusCode::NOT_FOUND, Json(inferred_form)).into_response()
        }
    };
    Ok(response)
}

/// Same input as `get_form`; returns the full match report with a verdict
/// for every candidate template.
pub async fn explain_form(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let body = parse_body(&body)?;
    Ok(Json(state.registry.explain_json(&body)?))
}
