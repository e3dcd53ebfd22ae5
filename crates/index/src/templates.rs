//! Template schemas and their store.

use std::sync::Arc;

use infer::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Collection, CompressionConfig, StoreBackend, StoreError, TemplateRef};

/// One typed field of a template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl TemplateField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A named, ordered schema of typed fields.
///
/// Names are not unique; `id` is. Fields never change after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub fields: Vec<TemplateField>,
}

impl Template {
    /// Build a template with a freshly allocated id.
    pub fn new(name: impl Into<String>, fields: Vec<TemplateField>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            fields,
        }
    }

    pub fn to_ref(&self) -> TemplateRef {
        TemplateRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Outcome of validating raw field descriptors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldValidation {
    pub accepted: Vec<TemplateField>,
    pub warnings: Vec<String>,
}

/// Validate raw `{name, type}` descriptors, keeping the good ones.
///
/// A descriptor is dropped with a warning when it is not an object, lacks a
/// non-empty string `name`, lacks a `type`, or names an unknown type. Order of
/// the accepted fields follows the input.
pub fn validate_fields(descriptors: &[Value]) -> FieldValidation {
    let mut out = FieldValidation::default();

    for descriptor in descriptors {
        let name = descriptor
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let declared = descriptor.get("type").filter(|v| is_present(v));

        let (Some(name), Some(declared)) = (name, declared) else {
            out.warnings
                .push(format!("Field {descriptor} is missing a name or type"));
            continue;
        };

        match declared.as_str().map(str::parse::<FieldType>) {
            Some(Ok(field_type)) => out.accepted.push(TemplateField::new(name, field_type)),
            _ => {
                let shown = declared
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| declared.to_string());
                out.warnings.push(format!(
                    "Field '{name}' has an invalid type ({shown}). Skipped."
                ));
            }
        }
    }

    out
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Persistent record of templates over a shared backend.
pub struct TemplateStore {
    backend: Arc<dyn StoreBackend>,
    compression: CompressionConfig,
}

impl TemplateStore {
    pub fn new(backend: Arc<dyn StoreBackend>, compression: CompressionConfig) -> Self {
        Self {
            backend,
            compression,
        }
    }

    /// Store a new template and return its id.
    pub fn create(
        &self,
        name: impl Into<String>,
        fields: Vec<TemplateField>,
    ) -> Result<String, StoreError> {
        let template = Template::new(name, fields);
        self.insert(&template)?;
        Ok(template.id)
    }

    /// Store a template whose id was allocated by the caller.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the id is taken.
    pub fn insert(&self, template: &Template) -> Result<(), StoreError> {
        let payload = self.compression.encode(template)?;
        self.backend
            .insert(Collection::Templates, &template.id, &payload)
    }

    pub fn get(&self, id: &str) -> Result<Option<Template>, StoreError> {
        self.backend
            .get(Collection::Templates, id)?
            .map(|bytes| self.compression.decode(&bytes))
            .transpose()
    }

    /// Every template, ordered by name and then id.
    pub fn list_all(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates = Vec::new();
        self.backend.scan(Collection::Templates, &mut |bytes| {
            templates.push(self.compression.decode::<Template>(bytes)?);
            Ok(())
        })?;
        templates.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(templates)
    }

    /// Drop every template. Prefer [`crate::FormStore::clear_all`], which
    /// clears the index in the same operation.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.backend.clear(&[Collection::Templates])
    }
}
