use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PDF_MIME: &str = "application/pdf";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// The two kinds of file the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Excel,
}

impl FileKind {
    /// Classify an upload by its declared MIME type or its filename extension.
    /// PDF wins when both kinds match. Returns `None` for anything else.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        let name = file_name.to_lowercase();
        let mime = content_type.unwrap_or("");

        if mime == PDF_MIME || name.ends_with(".pdf") {
            return Some(FileKind::Pdf);
        }
        if mime == XLSX_MIME || mime == XLS_MIME || name.ends_with(".xlsx") || name.ends_with(".xls")
        {
            return Some(FileKind::Excel);
        }
        None
    }

    /// Folder used to group blobs of this kind.
    pub fn folder(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdfs",
            FileKind::Excel => "excel",
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Excel => ".xlsx",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Excel => "excel",
        }
    }
}

/// Known extension of a filename (`.pdf`, `.xlsx`, `.xls`), lowercased.
pub fn known_extension(file_name: &str) -> Option<&'static str> {
    let name = file_name.to_lowercase();
    [".xlsx", ".xls", ".pdf"]
        .into_iter()
        .find(|ext| name.ends_with(ext))
}

/// Content type served for a stored extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        ".pdf" => PDF_MIME,
        ".xlsx" => XLSX_MIME,
        ".xls" => XLS_MIME,
        _ => "application/octet-stream",
    }
}

/// Where the bytes of a file live. One variant per storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageLocator {
    /// Relative path under the local storage root.
    Disk { path: String },
    /// Row in the `blobs` table of the metadata database.
    Embedded { key: String },
    /// Object in a bucket, with its public URL.
    Object { key: String, url: String },
}

impl StorageLocator {
    /// Backend key used for get/delete.
    pub fn key(&self) -> &str {
        match self {
            StorageLocator::Disk { path } => path,
            StorageLocator::Embedded { key } => key,
            StorageLocator::Object { key, .. } => key,
        }
    }
}

/// A file record stored in redb, keyed by slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub slug: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: u64,
    pub file_type: FileKind,
    pub extension: String,
    pub storage: StorageLocator,
}

impl FileRecord {
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.extension)
    }

    /// Relative URL of the viewer page.
    pub fn view_url(&self) -> String {
        format!("/{}", self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_mime_or_extension() {
        assert_eq!(FileKind::detect("a.pdf", None), Some(FileKind::Pdf));
        assert_eq!(FileKind::detect("A.PDF", None), Some(FileKind::Pdf));
        assert_eq!(
            FileKind::detect("report", Some(PDF_MIME)),
            Some(FileKind::Pdf)
        );
        assert_eq!(FileKind::detect("q.xlsx", None), Some(FileKind::Excel));
        assert_eq!(FileKind::detect("old.XLS", None), Some(FileKind::Excel));
        assert_eq!(
            FileKind::detect("blob", Some(XLS_MIME)),
            Some(FileKind::Excel)
        );
        assert_eq!(FileKind::detect("notes.docx", None), None);
        assert_eq!(
            FileKind::detect("notes.docx", Some("application/octet-stream")),
            None
        );
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(".pdf"), PDF_MIME);
        assert_eq!(content_type_for(".XLSX"), XLSX_MIME);
        assert_eq!(content_type_for(".xls"), XLS_MIME);
        assert_eq!(content_type_for(".csv"), "application/octet-stream");
    }

    #[test]
    fn known_extension_ignores_case() {
        assert_eq!(known_extension("Book.XLSX"), Some(".xlsx"));
        assert_eq!(known_extension("book.xls"), Some(".xls"));
        assert_eq!(known_extension("book"), None);
    }
}
