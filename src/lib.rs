//! Workspace umbrella crate for formfit.
//!
//! formfit stores named form templates (ordered `{name, type}` field lists)
//! and, given a submitted form, reports which template it satisfies. Field
//! types (`date`, `phone`, `email`, `text`) are inferred from raw values by
//! the [`infer`] crate, templates and the `(field, type)` index live in
//! [`index`], and candidate selection is done by [`matcher`].
//!
//! [`FormRegistry`] stitches these together so callers (the HTTP server, tests,
//! embedding applications) work against a single API entry point.
//!
//! ```
//! use formfit::{FormRegistry, TemplateRequest};
//! use serde_json::json;
//!
//! let registry = FormRegistry::in_memory();
//! let receipt = registry
//!     .create_template(&TemplateRequest::new(
//!         "Contact Form",
//!         json!([
//!             {"name": "name", "type": "text"},
//!             {"name": "email", "type": "email"},
//!         ]),
//!     ))
//!     .unwrap();
//! assert!(receipt.warnings.is_empty());
//!
//! let result = registry
//!     .match_json(&json!({"name": "Jane", "email": "jane@example.com"}))
//!     .unwrap();
//! assert_eq!(result.template_name(), Some("Contact Form"));
//! ```

pub mod config;

use std::sync::Arc;

pub use config::{ConfigLoadError, FormfitConfig, StorageYamlConfig};
pub use index::{
    BackendConfig, Collection, FieldType, FormStore, IndexEntry, IndexKey, StoreError, Template,
    TemplateField, TemplateRef,
};
pub use infer::UnknownFieldType;
pub use matcher::{
    set_match_metrics, CandidateReport, CandidateVerdict, FormSubmission, InferredForm, MatchError,
    MatchMetrics, MatchReport, MatchResult, Matcher,
};

use index::validate_fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by [`FormRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Template name is required")]
    MissingName,
    #[error("Field list is required")]
    MissingFields,
    #[error("Form fields are required")]
    EmptyForm,
    #[error(transparent)]
    UnknownFieldType(#[from] UnknownFieldType),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

impl RegistryError {
    /// `true` when the caller sent something unusable, as opposed to a
    /// storage failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistryError::MissingName
                | RegistryError::MissingFields
                | RegistryError::EmptyForm
                | RegistryError::UnknownFieldType(_)
        )
    }

    /// The underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RegistryError::Store(err) | RegistryError::Match(MatchError::Store(err)) => Some(err),
            _ => None,
        }
    }
}

/// A template creation request as submitted by a client.
///
/// `fields` stays raw JSON so malformed descriptors become warnings instead of
/// rejecting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Value>,
}

impl TemplateRequest {
    pub fn new(name: impl Into<String>, fields: Value) -> Self {
        Self {
            name: Some(name.into()),
            fields: Some(fields),
        }
    }

    /// Lenient extraction from an arbitrary JSON body. A non-string `name`
    /// counts as missing.
    pub fn from_json(body: &Value) -> Self {
        Self {
            name: body.get("name").and_then(Value::as_str).map(str::to_string),
            fields: body.get("fields").cloned(),
        }
    }
}

/// Result of a successful template creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateReceipt {
    pub id: String,
    /// One entry per skipped field descriptor.
    pub warnings: Vec<String>,
    /// The fields actually stored, in request order.
    pub fields: Vec<TemplateField>,
}

/// Template registration and form matching over one [`FormStore`].
pub struct FormRegistry {
    store: Arc<FormStore>,
    matcher: Matcher,
}

impl FormRegistry {
    pub fn new(store: Arc<FormStore>) -> Self {
        Self {
            matcher: Matcher::new(Arc::clone(&store)),
            store,
        }
    }

    /// Open the configured store, retrying the backend open per `config.retry`.
    pub fn open(config: &FormfitConfig) -> Result<Self, RegistryError> {
        let store = FormStore::open(&config.store_config())?;
        tracing::info!(backend = %config.storage.backend, "form store opened");
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(FormStore::in_memory()))
    }

    pub fn store(&self) -> &Arc<FormStore> {
        &self.store
    }

    /// Validate, index and store a template.
    ///
    /// The id is allocated first, the index is updated once per accepted
    /// field, and the template record is written last.
    pub fn create_template(
        &self,
        request: &TemplateRequest,
    ) -> Result<TemplateReceipt, RegistryError> {
        let name = request
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or(RegistryError::MissingName)?;
        let descriptors = request
            .fields
            .as_ref()
            .and_then(Value::as_array)
            .filter(|fields| !fields.is_empty())
            .ok_or(RegistryError::MissingFields)?;

        let validation = validate_fields(descriptors);
        for warning in &validation.warnings {
            tracing::warn!(template = name, "{warning}");
        }

        let template = Template::new(name, validation.accepted);
        let template_ref = template.to_ref();
        for field in &template.fields {
            self.store.index().build_index(
                &IndexKey::new(field.name.as_str(), field.field_type),
                &template_ref,
            )?;
        }
        self.store.templates().insert(&template)?;

        tracing::info!(
            template_id = %template.id,
            template = name,
            fields = template.field_count(),
            warnings = validation.warnings.len(),
            "template created"
        );

        Ok(TemplateReceipt {
            id: template.id,
            warnings: validation.warnings,
            fields: template.fields,
        })
    }

    /// Every stored template, ordered by name then id.
    pub fn list_templates(&self) -> Result<Vec<Template>, RegistryError> {
        Ok(self.store.templates().list_all()?)
    }

    /// Every index entry, ordered by key.
    pub fn list_index_entries(&self) -> Result<Vec<IndexEntry>, RegistryError> {
        Ok(self.store.index().entries()?)
    }

    pub fn match_form(&self, submission: &FormSubmission) -> Result<MatchResult, RegistryError> {
        Ok(self.matcher.match_form(submission)?)
    }

    pub fn explain_form(&self, submission: &FormSubmission) -> Result<MatchReport, RegistryError> {
        Ok(self.matcher.evaluate(submission)?)
    }

    /// Match a raw JSON body. Anything but a non-empty object is
    /// [`RegistryError::EmptyForm`].
    pub fn match_json(&self, body: &Value) -> Result<MatchResult, RegistryError> {
        self.match_form(&submission_from_json(body)?)
    }

    pub fn explain_json(&self, body: &Value) -> Result<MatchReport, RegistryError> {
        self.explain_form(&submission_from_json(body)?)
    }

    /// Remove every template and index entry.
    pub fn clear_all(&self) -> Result<(), RegistryError> {
        self.store.clear_all()?;
        self.store.flush()?;
        tracing::info!("database cleared");
        Ok(())
    }

    /// Check `value` against the named field type.
    pub fn validate_value(&self, kind: &str, value: &str) -> Result<bool, RegistryError> {
        let field_type: FieldType = kind.parse()?;
        Ok(infer::validate(field_type, value))
    }
}

/// Convert a JSON body into a submission.
pub fn submission_from_json(body: &Value) -> Result<FormSubmission, RegistryError> {
    match body.as_object() {
        Some(map) if !map.is_empty() => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        _ => Err(RegistryError::EmptyForm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_template_returns_accepted_fields_and_warnings() {
        let registry = FormRegistry::in_memory();
        let receipt = registry
            .create_template(&TemplateRequest::new(
                "Mixed",
                json!([
                    {"name": "email", "type": "email"},
                    {"name": "nickname"},
                    {"name": "age", "type": "number"},
                ]),
            ))
            .unwrap();

        assert_eq!(
            receipt.fields,
            vec![TemplateField::new("email", FieldType::Email)]
        );
        assert_eq!(receipt.warnings.len(), 2);

        let stored = registry.list_templates().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, receipt.id);
        assert_eq!(stored[0].fields, receipt.fields);
    }

    #[test]
    fn missing_name_or_fields_is_rejected() {
        let registry = FormRegistry::in_memory();
        let no_name = TemplateRequest {
            name: None,
            fields: Some(json!([{"name": "a", "type": "text"}])),
        };
        assert!(matches!(
            registry.create_template(&no_name),
            Err(RegistryError::MissingName)
        ));

        for fields in [None, Some(json!([])), Some(json!("email"))] {
            let request = TemplateRequest {
                name: Some("T".into()),
                fields,
            };
            assert!(matches!(
                registry.create_template(&request),
                Err(RegistryError::MissingFields)
            ));
        }
        assert!(registry.list_templates().unwrap().is_empty());
    }

    #[test]
    fn from_json_treats_non_string_name_as_missing() {
        let request = TemplateRequest::from_json(&json!({"name": 5, "fields": []}));
        assert_eq!(request.name, None);
        assert_eq!(request.fields, Some(json!([])));
    }

    #[test]
    fn match_json_rejects_empty_or_non_object_bodies() {
        let registry = FormRegistry::in_memory();
        for body in [json!({}), json!([]), json!("x"), Value::Null] {
            assert!(matches!(
                registry.match_json(&body),
                Err(RegistryError::EmptyForm)
            ));
        }
    }

    #[test]
    fn validate_value_by_kind() {
        let registry = FormRegistry::in_memory();
        assert!(registry.validate_value("phone", "+7 123 456 78 90").unwrap());
        assert!(!registry.validate_value("email", "nope").unwrap());
        assert!(registry.validate_value("text", "").unwrap());
        assert!(matches!(
            registry.validate_value("number", "1"),
            Err(RegistryError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn error_classification() {
        assert!(RegistryError::EmptyForm.is_client_error());
        let store = RegistryError::Store(StoreError::backend("down"));
        assert!(!store.is_client_error());
        assert!(store.store_error().is_some());
        assert_eq!(
            RegistryError::MissingFields.to_string(),
            "Field list is required"
        );
    }
}
