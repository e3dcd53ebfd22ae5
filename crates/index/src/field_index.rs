//! Inverted index from `(field name, field type)` to the templates declaring it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use infer::FieldType;
use serde::{Deserialize, Serialize};

use crate::{Collection, CompressionConfig, StoreBackend, StoreError};

/// Structured index key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub field_type: FieldType,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
        }
    }

    /// Human-readable `"<field>+<type>"` form. Not unique when `field` contains `+`.
    pub fn display_key(&self) -> String {
        format!("{}+{}", self.field, self.field_type)
    }

    /// Collision-free backend key: `%` and `+` in the field name are
    /// percent-escaped before joining with `+`.
    pub fn storage_key(&self) -> String {
        format!("{}+{}", escape_field(&self.field), self.field_type)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.field, self.field_type)
    }
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(['%', '+']) {
        Cow::Owned(field.replace('%', "%25").replace('+', "%2B"))
    } else {
        Cow::Borrowed(field)
    }
}

/// Reference from an index entry to a template. Identity is `id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: String,
    pub name: String,
}

/// One persisted index entry: every template declaring `key`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub key: IndexKey,
    /// Insertion order, no duplicate ids.
    pub templates: Vec<TemplateRef>,
}

impl IndexEntry {
    fn new(key: IndexKey) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key,
            templates: Vec::new(),
        }
    }

    pub fn contains(&self, template_id: &str) -> bool {
        self.templates.iter().any(|t| t.id == template_id)
    }
}

/// The inverted index over a shared backend.
pub struct FieldIndex {
    backend: Arc<dyn StoreBackend>,
    compression: CompressionConfig,
}

impl FieldIndex {
    pub fn new(backend: Arc<dyn StoreBackend>, compression: CompressionConfig) -> Self {
        Self {
            backend,
            compression,
        }
    }

    /// Record that `template` declares `key`.
    ///
    /// Idempotent: a template already listed under `key` is not added again.
    /// The check and the append happen inside one backend update, so
    /// concurrent callers can neither duplicate nor drop references.
    /// Returns `true` when the reference was appended.
    pub fn build_index(&self, key: &IndexKey, template: &TemplateRef) -> Result<bool, StoreError> {
        let mut appended = false;
        self.backend
            .update(Collection::IndexEntries, &key.storage_key(), &mut |current| {
                let mut entry = match current {
                    Some(bytes) => self.compression.decode::<IndexEntry>(bytes)?,
                    None => IndexEntry::new(key.clone()),
                };
                if entry.contains(&template.id) {
                    return Ok(None);
                }
                entry.templates.push(template.clone());
                appended = true;
                self.compression.encode(&entry).map(Some)
            })?;
        if appended {
            log::debug!("indexed template {} under {key}", template.id);
        }
        Ok(appended)
    }

    /// Templates declaring `key`; empty when the key was never indexed.
    pub fn find_templates_by_field(&self, key: &IndexKey) -> Result<Vec<TemplateRef>, StoreError> {
        Ok(self.entry(key)?.map(|e| e.templates).unwrap_or_default())
    }

    pub fn entry(&self, key: &IndexKey) -> Result<Option<IndexEntry>, StoreError> {
        self.backend
            .get(Collection::IndexEntries, &key.storage_key())?
            .map(|bytes| self.compression.decode(&bytes))
            .transpose()
    }

    /// Every entry, ordered by key.
    pub fn entries(&self) -> Result<Vec<IndexEntry>, StoreError> {
        let mut entries = Vec::new();
        self.backend.scan(Collection::IndexEntries, &mut |bytes| {
            entries.push(self.compression.decode::<IndexEntry>(bytes)?);
            Ok(())
        })?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Drop every entry. Prefer [`crate::FormStore::clear_all`], which clears
    /// templates in the same operation.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.backend.clear(&[Collection::IndexEntries])
    }
}
