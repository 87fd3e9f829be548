use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::response::{ApiError, AppQuery, JSend};
use crate::registry::NewUpload;
use crate::storage::models::{FileKind, FileRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub file_size: u64,
    pub file_type: FileKind,
    pub original_name: String,
    pub slug: String,
    pub uploaded_at: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeFileParams {
    #[serde(default)]
    pub download: Option<String>,
}

impl ServeFileParams {
    fn wants_attachment(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true"))
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .or_else(|| mime_guess::from_path(&original_name).first().map(|m| m.to_string()));

        let file_type = FileKind::detect(&original_name, content_type.as_deref())
            .ok_or_else(|| ApiError::bad_request("Only PDF and Excel files are allowed"))?;

        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() as u64 > state.config.max_upload_size {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {} bytes",
                state.config.max_upload_size
            )));
        }

        upload = Some(NewUpload {
            original_name,
            file_type,
            data,
        });
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let record = state.registry.create(upload).await?;

    tracing::info!(
        slug = %record.slug,
        file_type = record.file_type.as_str(),
        file_size = record.file_size,
        "Uploaded file"
    );

    Ok(JSend::success(file_to_response(&record)))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<FileResponse>>>, ApiError> {
    let files = state.registry.list_all()?;
    Ok(JSend::success(files.iter().map(file_to_response).collect()))
}

/// Serve file content by slug.
/// Route: GET /api/files/:slug
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    AppQuery(params): AppQuery<ServeFileParams>,
) -> Result<Response, ApiError> {
    let file = state
        .registry
        .lookup(&slug)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let data = state.registry.read(&file).await?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(file.content_type()),
    );

    let disposition = if params.wants_attachment() {
        "attachment"
    } else {
        "inline"
    };
    if let Ok(value) = content_disposition(disposition, &file.original_name).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Bytes never change for a slug, but the slug can be deleted and reused
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, max-age=300"),
    );

    Ok(response)
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    if !state.registry.remove(&slug).await? {
        return Err(ApiError::not_found("File not found"));
    }

    tracing::info!(slug = %slug, "Deleted file");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        file_size: file.file_size,
        file_type: file.file_type,
        original_name: file.original_name.clone(),
        slug: file.slug.clone(),
        uploaded_at: file.uploaded_at.to_rfc3339(),
        url: file.view_url(),
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Upload exceeds the maximum allowed size");
    }
    ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
}

/// `inline; filename="report.pdf"`, plus an RFC 5987 `filename*` when the
/// name is not plain ASCII.
fn content_disposition(disposition: &str, filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if ascii == filename {
        return format!("{disposition}; filename=\"{ascii}\"");
    }

    let mut encoded = String::new();
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("{disposition}; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_quoted() {
        assert_eq!(
            content_disposition("inline", "Report 2024.pdf"),
            "inline; filename=\"Report 2024.pdf\""
        );
    }

    #[test]
    fn unicode_names_get_extended_parameter() {
        assert_eq!(
            content_disposition("attachment", "Résumé.pdf"),
            "attachment; filename=\"R_sum_.pdf\"; filename*=UTF-8''R%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn quotes_are_replaced() {
        assert_eq!(
            content_disposition("inline", "a\"b.pdf"),
            "inline; filename=\"a_b.pdf\"; filename*=UTF-8''a%22b.pdf"
        );
    }
}
