//! The slug registry: the single source of truth for which slugs are live
//! and where each file's bytes are kept.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;

use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::slug::{self, SlugStrategy};
use crate::storage::models::{known_extension, FileKind, FileRecord};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Metadata error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),
}

/// An accepted upload, before a slug has been assigned.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub original_name: String,
    pub file_type: FileKind,
    pub data: Bytes,
}

/// Maps slugs to file metadata and bytes.
///
/// Created once at startup and shared through `AppState`.
pub struct FileRegistry {
    db: Database,
    store: Arc<dyn ObjectStore>,
    strategy: SlugStrategy,
}

impl FileRegistry {
    pub fn new(db: Database, store: Arc<dyn ObjectStore>, strategy: SlugStrategy) -> Self {
        Self {
            db,
            store,
            strategy,
        }
    }

    pub fn strategy(&self) -> SlugStrategy {
        self.strategy
    }

    /// First free slug among `base`, `base-2`, `base-3`, … right now.
    pub fn allocate_unique_slug(&self, base: &str) -> Result<String, RegistryError> {
        Ok(slug::allocate_unique_slug(base, |candidate| {
            self.db.slug_exists(candidate)
        })?)
    }

    /// Store the bytes, then claim the first free slug candidate for them.
    ///
    /// Claiming is an insert-if-absent, so an upload that loses a race for
    /// a slug simply moves on to the next candidate.
    pub async fn create(&self, upload: NewUpload) -> Result<FileRecord, RegistryError> {
        let extension = known_extension(&upload.original_name)
            .filter(|ext| FileKind::detect(ext, None) == Some(upload.file_type))
            .unwrap_or(upload.file_type.default_extension())
            .to_string();
        let key = format!(
            "{}/{}{}",
            upload.file_type.folder(),
            uuid::Uuid::new_v4(),
            extension
        );
        let file_size = upload.data.len() as u64;

        self.store.put(&key, upload.data).await?;

        let mut record = FileRecord {
            slug: String::new(),
            original_name: upload.original_name,
            uploaded_at: Utc::now(),
            file_size,
            file_type: upload.file_type,
            extension,
            storage: self.store.locate(&key),
        };

        match self.claim_slug(&mut record) {
            Ok(()) => Ok(record),
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned blob");
                }
                Err(e)
            }
        }
    }

    fn claim_slug(&self, record: &mut FileRecord) -> Result<(), RegistryError> {
        for candidate in self.strategy.candidates(&record.original_name) {
            if self.db.slug_exists(&candidate)? {
                continue;
            }
            record.slug = candidate;
            if self.db.insert_file_if_absent(record)? {
                return Ok(());
            }
            tracing::debug!(slug = %record.slug, "Lost slug race, trying next candidate");
        }
        unreachable!("slug candidates never run out")
    }

    /// Metadata for a slug, or `None` if it is not registered.
    pub fn lookup(&self, slug: &str) -> Result<Option<FileRecord>, RegistryError> {
        Ok(self.db.get_file(slug)?)
    }

    /// The stored bytes of a file.
    pub async fn read(&self, record: &FileRecord) -> Result<Bytes, RegistryError> {
        Ok(self.store.get(record.storage.key()).await?)
    }

    /// Every record, newest upload first.
    pub fn list_all(&self) -> Result<Vec<FileRecord>, RegistryError> {
        Ok(self.db.list_files()?)
    }

    /// Remove a slug's metadata, then its bytes on a best-effort basis.
    /// Returns `false` if the slug was not registered.
    pub async fn remove(&self, slug: &str) -> Result<bool, RegistryError> {
        let Some(record) = self.db.get_file(slug)? else {
            return Ok(false);
        };

        if !self.db.delete_file(slug)? {
            return Ok(false);
        }

        if let Err(e) = self.store.delete(record.storage.key()).await {
            tracing::warn!(slug = %slug, error = %e, "Failed to delete file bytes");
        }
        Ok(true)
    }
}
