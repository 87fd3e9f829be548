mod embedded;
mod gcs;
mod local;

pub use embedded::EmbeddedStore;
pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::storage::models::StorageLocator;
use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over the places file bytes can live.
/// Keys are `<folder>/<uuid><ext>`; the blobs mean nothing without the metadata DB.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// The locator recorded in metadata for an object stored under `key`.
    fn locate(&self, key: &str) -> StorageLocator;
}
