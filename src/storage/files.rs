use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert a file record unless its slug is already taken.
    ///
    /// The check and the insert share one write transaction, so two uploads
    /// racing for the same slug cannot both succeed. Returns `false` when the
    /// slug was already present and nothing was written.
    pub fn insert_file_if_absent(&self, file: &FileRecord) -> Result<bool, DatabaseError> {
        debug_assert!(!file.slug.is_empty(), "file slug must not be empty");

        let write_txn = self.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(FILES)?;
            let taken = table.get(file.slug.as_str())?.is_some();
            if taken {
                false
            } else {
                let data = rmp_serde::to_vec_named(file)?;
                table.insert(file.slug.as_str(), data.as_slice())?;
                true
            }
        };

        if inserted {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(inserted)
    }

    /// Get a file by its slug
    pub fn get_file(&self, slug: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(slug)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Check if a slug is already in use
    pub fn slug_exists(&self, slug: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        Ok(table.get(slug)?.is_some())
    }

    /// Delete a file record by slug. Returns `false` if there was none.
    pub fn delete_file(&self, slug: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(FILES)?;
            let removed = table.remove(slug)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// All files, newest upload first. Ties fall back to slug order.
    pub fn list_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(files)
    }

    // ========================================================================
    // Blob operations (embedded backend)
    // ========================================================================

    pub fn put_blob(&self, key: &str, data: &[u8]) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(BLOBS)?;
            table.insert(key, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(BLOBS)?;
        let result = table.get(key)?.map(|data| data.value().to_vec());
        Ok(result)
    }

    /// Remove a blob. Missing keys are not an error.
    pub fn delete_blob(&self, key: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(BLOBS)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    pub fn blob_exists(&self, key: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(BLOBS)?;
        Ok(table.get(key)?.is_some())
    }
}
