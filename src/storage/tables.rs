use redb::TableDefinition;

/// File records: slug -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Raw file bytes for the embedded backend: blob key -> bytes
pub const BLOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");
