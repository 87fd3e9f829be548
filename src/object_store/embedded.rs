use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStore, ObjectStoreError};
use crate::storage::models::StorageLocator;
use crate::storage::Database;

/// Keeps file bytes inside the metadata database's `blobs` table.
pub struct EmbeddedStore {
    db: Database,
}

impl EmbeddedStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ObjectStore for EmbeddedStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        self.db.put_blob(key, &data)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.db
            .get_blob(key)?
            .map(Bytes::from)
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.db.delete_blob(key)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.db.blob_exists(key)?)
    }

    fn locate(&self, key: &str) -> StorageLocator {
        StorageLocator::Embedded {
            key: key.to_string(),
        }
    }
}
