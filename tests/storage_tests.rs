use chrono::{Duration, Utc};
use docshare::storage::models::{FileKind, FileRecord, StorageLocator};
use docshare::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_file(slug: &str) -> FileRecord {
    FileRecord {
        slug: slug.to_string(),
        original_name: format!("{slug}.pdf"),
        uploaded_at: Utc::now(),
        file_size: 1024,
        file_type: FileKind::Pdf,
        extension: ".pdf".to_string(),
        storage: StorageLocator::Disk {
            path: format!("pdfs/{slug}.pdf"),
        },
    }
}

#[test]
fn test_insert_and_get_file() {
    let (_dir, db) = test_db();
    let file = sample_file("report");

    assert!(db.insert_file_if_absent(&file).unwrap());

    let retrieved = db.get_file("report").unwrap().expect("file should exist");
    assert_eq!(retrieved, file);
}

#[test]
fn test_insert_refuses_taken_slug() {
    let (_dir, db) = test_db();
    let first = sample_file("report");
    let mut second = sample_file("report");
    second.original_name = "other.pdf".to_string();

    assert!(db.insert_file_if_absent(&first).unwrap());
    assert!(!db.insert_file_if_absent(&second).unwrap());

    let stored = db.get_file("report").unwrap().unwrap();
    assert_eq!(stored.original_name, "report.pdf");
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("nonexistent").unwrap().is_none());
    assert!(!db.slug_exists("nonexistent").unwrap());
}

#[test]
fn test_delete_file() {
    let (_dir, db) = test_db();
    db.insert_file_if_absent(&sample_file("gone")).unwrap();
    assert!(db.slug_exists("gone").unwrap());

    assert!(db.delete_file("gone").unwrap());
    assert!(!db.slug_exists("gone").unwrap());
    assert!(!db.delete_file("gone").unwrap());
}

#[test]
fn test_list_files_newest_first() {
    let (_dir, db) = test_db();
    let now = Utc::now();

    let mut old = sample_file("old");
    old.uploaded_at = now - Duration::hours(2);
    let mut new = sample_file("new");
    new.uploaded_at = now;
    let mut middle = sample_file("middle");
    middle.uploaded_at = now - Duration::hours(1);

    for file in [&old, &new, &middle] {
        db.insert_file_if_absent(file).unwrap();
    }

    let slugs: Vec<String> = db
        .list_files()
        .unwrap()
        .into_iter()
        .map(|f| f.slug)
        .collect();
    assert_eq!(slugs, vec!["new", "middle", "old"]);
}

#[test]
fn test_list_files_empty() {
    let (_dir, db) = test_db();
    assert!(db.list_files().unwrap().is_empty());
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileRecord {
        storage: StorageLocator::Object {
            key: "excel/x.xlsx".to_string(),
            url: "https://storage.googleapis.com/bucket/excel/x.xlsx".to_string(),
        },
        file_type: FileKind::Excel,
        extension: ".xlsx".to_string(),
        ..sample_file("sheet")
    };

    {
        let db = Database::open(dir.path()).unwrap();
        db.insert_file_if_absent(&file).unwrap();
    }

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.get_file("sheet").unwrap(), Some(file));
}

#[test]
fn test_blob_operations() {
    let (_dir, db) = test_db();

    assert!(db.get_blob("pdfs/a.pdf").unwrap().is_none());
    assert!(!db.blob_exists("pdfs/a.pdf").unwrap());

    db.put_blob("pdfs/a.pdf", b"first").unwrap();
    db.put_blob("pdfs/a.pdf", b"second").unwrap();
    assert_eq!(db.get_blob("pdfs/a.pdf").unwrap(), Some(b"second".to_vec()));

    assert!(db.delete_blob("pdfs/a.pdf").unwrap());
    assert!(!db.delete_blob("pdfs/a.pdf").unwrap());
}
