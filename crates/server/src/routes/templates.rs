use crate::error::ServerResult;
use crate::routes::parse_body;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use formfit::{IndexEntry, Template, TemplateField, TemplateRef, TemplateRequest};
use serde::Serialize;
use std::sync::Arc;

/// Create template response
#[derive(Debug, Serialize)]
pub struct CreateTemplateResponse {
    pub message: String,
    pub template_id: String,
    pub warnings: Vec<String>,
    pub fields: Vec<TemplateField>,
}

/// Stored template as listed by `GET /templates`
#[derive(Debug, Serialize)]
pub struct TemplateView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub fields: Vec<TemplateField>,
}

impl From<Template> for TemplateView {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            name: template.name,
            fields: template.fields,
        }
    }
}

/// Index entry as listed by `GET /indexes`
#[derive(Debug, Serialize)]
pub struct IndexEntryView {
    #[serde(rename = "_id")]
    pub id: String,
    /// `"<field>+<type>"`
    pub key: String,
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: formfit::FieldType,
    pub templates: Vec<TemplateRef>,
}

impl From<IndexEntry> for IndexEntryView {
    fn from(entry: IndexEntry) -> Self {
        Self {
            id: entry.id,
            key: entry.key.display_key(),
            field: entry.key.field,
            field_type: entry.key.field_type,
            templates: entry.templates,
        }
    }
}

/// Create a template from `{name, fields: [{name, type}, ...]}`.
///
/// Malformed field descriptors are skipped and reported in `warnings`.
pub async fn create_template(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let body = parse_body(&body)?;
    let request = TemplateRequest::from_json(&body);
    let receipt = state.registry.create_template(&request)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTemplateResponse {
            message: "Template created successfully".to_string(),
            template_id: receipt.id,
            warnings: receipt.warnings,
            fields: receipt.fields,
        }),
    ))
}

/// List all templates
pub async fn list_templates(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let templates: Vec<TemplateView> = state
        .registry
        .list_templates()?
        .into_iter()
        .map(TemplateView::from)
        .collect();
    Ok(Json(templates))
}

/// List all index entries
pub async fn list_indexes(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let entries: Vec<IndexEntryView> = state
        .registry
        .list_index_entries()?
        .into_iter()
        .map(IndexEntryView::from)
        .collect();
    Ok(Json(entries))
}

/// Remove every template and index entry
pub async fn clear_db(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    state.registry.clear_all()?;
    Ok(Json(serde_json::json!({
        "message": "Database cleared successfully"
    })))
}
