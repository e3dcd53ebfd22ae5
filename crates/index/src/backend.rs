use crate::retry::{execute_with_retry, RetryConfig};
use crate::StoreError;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// The two record sets a form store persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Template schemas, keyed by template id.
    Templates,
    /// Inverted index entries, keyed by the encoded `(field, type)` pair.
    IndexEntries,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::IndexEntries, Collection::Templates];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Templates => "templates",
            Collection::IndexEntries => "index_entries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-modify-write callback for [`StoreBackend::update`].
///
/// Receives the current value (if any). Returning `Ok(Some(bytes))` stores the
/// new value, `Ok(None)` leaves the record untouched, and an error aborts the
/// update without writing.
pub type UpdateFn<'a> = dyn FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>, StoreError> + 'a;

/// Trait for a key-value storage backend holding both record sets.
/// This allows for different storage implementations (e.g., in-memory, Redb).
pub trait StoreBackend: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::DuplicateKey`] if the key exists.
    fn insert(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Retrieve a value by key.
    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Atomically read, transform and write back one record.
    ///
    /// No other write to the backend may interleave between the read handed to
    /// `f` and the write of its result. Returns `true` when a value was written.
    fn update(
        &self,
        collection: Collection,
        key: &str,
        f: &mut UpdateFn<'_>,
    ) -> Result<bool, StoreError>;
    /// Scan all values in a collection, calling the visitor for each one.
    fn scan(
        &self,
        collection: Collection,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
    /// Remove every record from the given collections as one operation.
    fn clear(&self, collections: &[Collection]) -> Result<(), StoreError>;
    /// Flush any buffered writes to the backend.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb file database
/// let config = BackendConfig::redb("/data/formfit.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Use Redb for storage. The `path` is the file path for the database.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// Use an in-memory map. Contents are lost when the process exits.
    #[default]
    InMemory,
}

impl BackendConfig {
    /// Create an in-memory backend configuration.
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    /// Create a Redb backend configuration.
    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend based on the configuration.
    pub fn build(&self) -> Result<Box<dyn StoreBackend>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }

    /// Build the backend, retrying failed opens according to `retry`.
    ///
    /// Only bootstrap is retried; operations on the returned backend are not.
    pub fn build_with_retry(
        &self,
        retry: &RetryConfig,
    ) -> Result<Box<dyn StoreBackend>, StoreError> {
        execute_with_retry(retry, |attempt| {
            self.build().inspect_err(|err| {
                log::warn!(
                    "opening {self:?} failed (attempt {}/{}): {err}",
                    attempt + 1,
                    retry.max_retries + 1
                );
            })
        })
    }
}

type Records = HashMap<Collection, HashMap<String, Vec<u8>>>;

/// An in-memory backend using a single `RwLock` around both collections.
pub struct InMemoryBackend {
    records: RwLock<Records>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    fn insert(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let table = guard.entry(collection).or_default();
        if table.contains_key(key) {
            return Err(StoreError::duplicate(collection, key));
        }
        table.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard
            .get(&collection)
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn update(
        &self,
        collection: Collection,
        key: &str,
        f: &mut UpdateFn<'_>,
    ) -> Result<bool, StoreError> {
        // The write lock spans the read, the callback and the write.
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let table = guard.entry(collection).or_default();
        match f(table.get(key).map(Vec::as_slice))? {
            Some(next) => {
                table.insert(key.to_string(), next);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn scan(
        &self,
        collection: Collection,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if let Some(table) = guard.get(&collection) {
            for value in table.values() {
                visitor(value)?;
            }
        }
        Ok(())
    }

    fn clear(&self, collections: &[Collection]) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        for collection in collections {
            guard.remove(collection);
        }
        Ok(())
    }
}

/// The Redb backend implementation.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_existing_keys() {
        let backend = InMemoryBackend::new();
        backend.insert(Collection::Templates, "t1", b"a").unwrap();
        let err = backend
            .insert(Collection::Templates, "t1", b"b")
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(
            backend.get(Collection::Templates, "t1").unwrap(),
            Some(b"a".to_vec())
        );
    }

    #[test]
    fn collections_are_separate() {
        let backend = InMemoryBackend::new();
        backend.insert(Collection::Templates, "k", b"tpl").unwrap();
        backend.insert(Collection::IndexEntries, "k", b"idx").unwrap();
        assert_eq!(
            backend.get(Collection::Templates, "k").unwrap(),
            Some(b"tpl".to_vec())
        );
        assert_eq!(
            backend.get(Collection::IndexEntries, "k").unwrap(),
            Some(b"idx".to_vec())
        );
    }

    #[test]
    fn update_can_create_modify_or_skip() {
        let backend = InMemoryBackend::new();
        let wrote = backend
            .update(Collection::IndexEntries, "k", &mut |current| {
                assert!(current.is_none());
                Ok(Some(b"1".to_vec()))
            })
            .unwrap();
        assert!(wrote);

        let wrote = backend
            .update(Collection::IndexEntries, "k", &mut |current| {
                let mut next = current.unwrap().to_vec();
                next.push(b'2');
                Ok(Some(next))
            })
            .unwrap();
        assert!(wrote);

        let wrote = backend
            .update(Collection::IndexEntries, "k", &mut |_| Ok(None))
            .unwrap();
        assert!(!wrote);
        assert_eq!(
            backend.get(Collection::IndexEntries, "k").unwrap(),
            Some(b"12".to_vec())
        );
    }

    #[test]
    fn failed_update_writes_nothing() {
        let backend = InMemoryBackend::new();
        let result = backend.update(Collection::IndexEntries, "k", &mut |_| {
            Err(StoreError::Encode("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(backend.get(Collection::IndexEntries, "k").unwrap(), None);
    }

    #[test]
    fn clear_only_touches_named_collections() {
        let backend = InMemoryBackend::new();
        backend.insert(Collection::Templates, "t", b"x").unwrap();
        backend.insert(Collection::IndexEntries, "i", b"y").unwrap();

        backend.clear(&[Collection::IndexEntries]).unwrap();
        assert_eq!(backend.get(Collection::IndexEntries, "i").unwrap(), None);
        assert!(backend.get(Collection::Templates, "t").unwrap().is_some());

        backend.clear(&Collection::ALL).unwrap();
        let mut seen = 0;
        backend
            .scan(Collection::Templates, &mut |_| {
                seen += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn in_memory_config_builds() {
        let backend = BackendConfig::in_memory().build().unwrap();
        backend.insert(Collection::Templates, "a", b"b").unwrap();
        assert!(backend.get(Collection::Templates, "a").unwrap().is_some());
    }
}
