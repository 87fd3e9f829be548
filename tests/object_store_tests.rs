use bytes::Bytes;
use docshare::object_store::{EmbeddedStore, LocalStore, ObjectStore, ObjectStoreError};
use docshare::storage::models::StorageLocator;
use docshare::storage::Database;

#[tokio::test]
async fn test_local_store_put_get_nested_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("%PDF-1.4");
    store.put("pdfs/abc.pdf", data.clone()).await.unwrap();

    assert!(dir.path().join("pdfs").join("abc.pdf").exists());
    assert_eq!(store.get("pdfs/abc.pdf").await.unwrap(), data);
}

#[tokio::test]
async fn test_local_store_exists_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert!(!store.exists("excel/a.xlsx").await.unwrap());
    store.put("excel/a.xlsx", Bytes::from("data")).await.unwrap();
    assert!(store.exists("excel/a.xlsx").await.unwrap());

    store.delete("excel/a.xlsx").await.unwrap();
    assert!(!store.exists("excel/a.xlsx").await.unwrap());

    // Deleting a missing key is not an error
    store.delete("excel/a.xlsx").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.get("pdfs/missing.pdf").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("root")).unwrap();

    for key in ["../escape.pdf", "/etc/passwd", "pdfs/../../x", ""] {
        let result = store.put(key, Bytes::from("x")).await;
        assert!(
            matches!(result, Err(ObjectStoreError::InvalidKey(_))),
            "key {key:?} should be rejected"
        );
    }
    assert!(!dir.path().join("escape.pdf").exists());
}

#[tokio::test]
async fn test_local_store_locator() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert_eq!(
        store.locate("pdfs/a.pdf"),
        StorageLocator::Disk {
            path: "pdfs/a.pdf".to_string()
        }
    );
}

#[tokio::test]
async fn test_embedded_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let store = EmbeddedStore::new(db.clone());

    let data = Bytes::from_static(b"PK\x03\x04 workbook");
    store.put("excel/b.xlsx", data.clone()).await.unwrap();

    assert!(store.exists("excel/b.xlsx").await.unwrap());
    assert_eq!(store.get("excel/b.xlsx").await.unwrap(), data);
    assert!(db.blob_exists("excel/b.xlsx").unwrap());
    assert_eq!(
        store.locate("excel/b.xlsx"),
        StorageLocator::Embedded {
            key: "excel/b.xlsx".to_string()
        }
    );

    store.delete("excel/b.xlsx").await.unwrap();
    assert!(matches!(
        store.get("excel/b.xlsx").await,
        Err(ObjectStoreError::NotFound(_))
    ));
    store.delete("excel/b.xlsx").await.unwrap();
}
