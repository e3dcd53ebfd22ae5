//! Redb (Rust embedded database) backend for formfit storage.
//!
//! Each [`Collection`] maps to its own redb table. Every mutating call runs in
//! a single write transaction; redb admits one writer at a time, which is what
//! makes [`StoreBackend::update`] an atomic read-modify-write and
//! [`StoreBackend::clear`] all-or-nothing across collections.
//!
//! # Configuration Example
//! ```yaml
//! storage:
//!   backend: "redb"
//!   path: "/data/formfit.redb"
//! ```

use crate::backend::UpdateFn;
use crate::{Collection, StoreBackend, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const TEMPLATES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("templates");
const INDEX_ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("index_entries");

fn table_for(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match collection {
        Collection::Templates => TEMPLATES_TABLE,
        Collection::IndexEntries => INDEX_ENTRIES_TABLE,
    }
}

/// Redb backend implementation for persistent storage.
///
/// The `Arc<Database>` wrapper allows safe sharing across threads; redb
/// handles its own internal locking and MVCC.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a Redb database at the given path, creating both tables.
    ///
    /// # Example
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/formfit.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(StoreError::backend)?;

        let write_txn = db.begin_write().map_err(StoreError::backend)?;
        for collection in Collection::ALL {
            // Accessing the table creates it if it doesn't exist
            write_txn
                .open_table(table_for(collection))
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StoreBackend for RedbBackend {
    fn insert(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = write_txn
                .open_table(table_for(collection))
                .map_err(StoreError::backend)?;
            if table.get(key).map_err(StoreError::backend)?.is_some() {
                return Err(StoreError::duplicate(collection, key));
            }
            table.insert(key, value).map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;
        Ok(())
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(table_for(collection))
            .map_err(StoreError::backend)?;

        match table.get(key).map_err(StoreError::backend)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn update(
        &self,
        collection: Collection,
        key: &str,
        f: &mut UpdateFn<'_>,
    ) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        let wrote = {
            let mut table = write_txn
                .open_table(table_for(collection))
                .map_err(StoreError::backend)?;
            let current = table
                .get(key)
                .map_err(StoreError::backend)?
                .map(|guard| guard.value().to_vec());
            // An error here drops the transaction uncommitted.
            match f(current.as_deref())? {
                Some(next) => {
                    table
                        .insert(key, next.as_slice())
                        .map_err(StoreError::backend)?;
                    true
                }
                None => false,
            }
        };
        if wrote {
            write_txn.commit().map_err(StoreError::backend)?;
        } else {
            write_txn.abort().map_err(StoreError::backend)?;
        }
        Ok(wrote)
    }

    fn scan(
        &self,
        collection: Collection,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(table_for(collection))
            .map_err(StoreError::backend)?;

        for item in table.iter().map_err(StoreError::backend)? {
            let (_, value) = item.map_err(StoreError::backend)?;
            visitor(value.value())?;
        }

        Ok(())
    }

    fn clear(&self, collections: &[Collection]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        for &collection in collections {
            write_txn
                .delete_table(table_for(collection))
                .map_err(StoreError::backend)?;
            // Recreate so readers never hit a missing table.
            write_txn
                .open_table(table_for(collection))
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        // Redb commits are synchronous and durable, so there is nothing to flush.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_redb_backend_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend
            .insert(Collection::Templates, "key1", b"value1")
            .unwrap();
        let result = backend.get(Collection::Templates, "key1").unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));

        let result = backend.get(Collection::Templates, "nonexistent").unwrap();
        assert_eq!(result, None);
        let result = backend.get(Collection::IndexEntries, "key1").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_redb_backend_duplicate_insert() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.insert(Collection::Templates, "key1", b"a").unwrap();
        let err = backend
            .insert(Collection::Templates, "key1", b"b")
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(
            backend.get(Collection::Templates, "key1").unwrap(),
            Some(b"a".to_vec())
        );
    }

    #[test]
    fn test_redb_backend_update() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        assert!(backend
            .update(Collection::IndexEntries, "k", &mut |current| {
                assert!(current.is_none());
                Ok(Some(b"v1".to_vec()))
            })
            .unwrap());
        assert!(!backend
            .update(Collection::IndexEntries, "k", &mut |_| Ok(None))
            .unwrap());
        assert!(backend
            .update(Collection::IndexEntries, "k", &mut |_| Err(
                StoreError::Encode("nope".into())
            ))
            .is_err());

        assert_eq!(
            backend.get(Collection::IndexEntries, "k").unwrap(),
            Some(b"v1".to_vec())
        );
    }

    #[test]
    fn test_redb_backend_scan_and_clear() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.insert(Collection::Templates, "key1", b"value1").unwrap();
        backend.insert(Collection::Templates, "key2", b"value2").unwrap();
        backend.insert(Collection::IndexEntries, "idx", b"entry").unwrap();

        let mut collected = Vec::new();
        backend
            .scan(Collection::Templates, &mut |value| {
                collected.push(value.to_vec());
                Ok(())
            })
            .unwrap();

        assert_eq!(collected.len(), 2);
        assert!(collected.contains(&b"value1".to_vec()));
        assert!(collected.contains(&b"value2".to_vec()));

        backend.clear(&Collection::ALL).unwrap();
        assert_eq!(backend.get(Collection::Templates, "key1").unwrap(), None);
        assert_eq!(backend.get(Collection::IndexEntries, "idx").unwrap(), None);

        // Tables are usable again after a clear.
        backend.insert(Collection::Templates, "key1", b"again").unwrap();
        assert!(backend.get(Collection::Templates, "key1").unwrap().is_some());
    }

    #[test]
    fn test_redb_backend_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let backend = RedbBackend::open(temp_file.path()).unwrap();
            backend.insert(Collection::Templates, "persisted", b"yes").unwrap();
        }
        let backend = RedbBackend::open(temp_file.path()).unwrap();
        assert_eq!(
            backend.get(Collection::Templates, "persisted").unwrap(),
            Some(b"yes".to_vec())
        );
    }
}
