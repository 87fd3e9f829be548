//! Shared helpers for router-level tests.

use std::sync::Arc;

use crate::config::{AuthConfig, Config, ServerConfig, StorageBackend, StorageConfig};
use crate::object_store::{EmbeddedStore, LocalStore, ObjectStore};
use crate::pages::Pages;
use crate::registry::FileRegistry;
use crate::slug::SlugStrategy;
use crate::storage::Database;
use crate::AppState;

pub const TEST_USERNAME: &str = "pradmin";
pub const TEST_PASSWORD: &str = "test-password";

/// AppState over a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    test_state_with(temp_dir, StorageBackend::Local, SlugStrategy::Filename)
}

pub fn test_state_with(
    temp_dir: &tempfile::TempDir,
    backend: StorageBackend,
    slug_strategy: SlugStrategy,
) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("uploads");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            backend,
            local_storage_path: files_dir.to_string_lossy().to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        },
        auth: AuthConfig {
            admin_username: TEST_USERNAME.to_string(),
            admin_password: TEST_PASSWORD.to_string(),
            secure_cookies: false,
        },
        slug_strategy,
        max_upload_size: 1024 * 1024, // 1MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let store: Arc<dyn ObjectStore> = match backend {
        StorageBackend::Embedded => Arc::new(EmbeddedStore::new(db.clone())),
        _ => Arc::new(LocalStore::new(&files_dir).expect("Failed to create test object store")),
    };

    Arc::new(AppState {
        registry: FileRegistry::new(db, store, slug_strategy),
        pages: Pages::new().expect("Failed to compile templates"),
        session_token: uuid::Uuid::new_v4().simple().to_string(),
        config,
    })
}
