//! # formfit Index
//!
//! Persistent storage for form templates and the inverted index that lets the
//! matcher find candidate templates from a submission's typed fields.
//!
//! ## Core Pieces
//!
//! - **Pluggable Backends**: both record sets live behind the [`StoreBackend`]
//!   trait. Out of the box it provides:
//!   - An in-memory backend for fast, ephemeral storage (ideal for testing).
//!   - A Redb backend for persistent, on-disk storage (`backend-redb` feature).
//! - [`FieldIndex`]: maps an [`IndexKey`] (field name + [`FieldType`]) to every
//!   template declaring that typed field. Appends are idempotent and atomic.
//! - [`TemplateStore`]: template schemas keyed by id, plus [`validate_fields`]
//!   for turning raw descriptors into typed fields with warnings.
//! - [`FormStore`]: owns one backend and hands both stores the same handle, so
//!   they can be cleared together.
//!
//! Records are encoded with bincode and compressed with zstd by default
//! (see [`CompressionConfig`]).
//!
//! ## Example Usage
//!
//! ```
//! use index::{FormStore, IndexKey, StoreConfig, TemplateField};
//! use infer::FieldType;
//!
//! let store = FormStore::open(&StoreConfig::new()).unwrap();
//!
//! let template = index::Template::new(
//!     "Contact Form",
//!     vec![TemplateField::new("email", FieldType::Email)],
//! );
//! let key = IndexKey::new("email", FieldType::Email);
//! store.index().build_index(&key, &template.to_ref()).unwrap();
//! store.templates().insert(&template).unwrap();
//!
//! let refs = store.index().find_templates_by_field(&key).unwrap();
//! assert_eq!(refs[0].name, "Contact Form");
//!
//! store.clear_all().unwrap();
//! assert!(store.templates().list_all().unwrap().is_empty());
//! ```

mod backend;
mod codec;
mod field_index;
pub mod retry;
mod templates;

use std::sync::Arc;

pub use backend::{BackendConfig, Collection, InMemoryBackend, StoreBackend, UpdateFn};
#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use codec::{CompressionCodec, CompressionConfig, RECORD_SCHEMA_VERSION};
pub use field_index::{FieldIndex, IndexEntry, IndexKey, TemplateRef};
pub use infer::FieldType;
pub use retry::RetryConfig;
pub use templates::{validate_fields, FieldValidation, Template, TemplateField, TemplateStore};

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// Storage error.
///
/// [`StoreError::DuplicateKey`] is kept apart from the infrastructure kinds so
/// callers can report it as a client problem.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Duplicate key `{key}` in {collection}")]
    DuplicateKey { collection: Collection, key: String },
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Zstd(e.to_string())
    }
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn duplicate(collection: Collection, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection,
            key: key.into(),
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

/// Config for opening a [`FormStore`].
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Backend storage configuration (in-memory or Redb).
    pub backend: BackendConfig,
    /// Compression settings for stored records.
    pub compression: CompressionConfig,
    /// Retry policy for opening the backend.
    pub retry: RetryConfig,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Template store and field index sharing one backend.
pub struct FormStore {
    backend: Arc<dyn StoreBackend>,
    templates: TemplateStore,
    index: FieldIndex,
}

impl FormStore {
    /// Build the configured backend (retrying the open per `cfg.retry`).
    pub fn open(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let backend = cfg.backend.build_with_retry(&cfg.retry)?;
        Ok(Self::with_backend(
            Arc::from(backend),
            cfg.compression.clone(),
        ))
    }

    /// Wrap an existing backend (e.g., a shared or custom one).
    pub fn with_backend(backend: Arc<dyn StoreBackend>, compression: CompressionConfig) -> Self {
        Self {
            templates: TemplateStore::new(Arc::clone(&backend), compression.clone()),
            index: FieldIndex::new(Arc::clone(&backend), compression),
            backend,
        }
    }

    /// Convenience helper for tests and ephemeral use.
    pub fn in_memory() -> Self {
        Self::with_backend(
            Arc::new(InMemoryBackend::new()),
            CompressionConfig::default(),
        )
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    /// Clear index entries and templates in one backend operation, so no
    /// index entry outlives its template.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.backend.clear(&Collection::ALL)?;
        log::info!("cleared templates and index entries");
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.backend.flush()
    }
}
