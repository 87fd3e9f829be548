use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::materialize_blocking;
use crate::api::auth::safe_next;
use crate::api::response::AppQuery;
use crate::pages::{self, format_file_size};
use crate::spreadsheet::{self, SheetData};
use crate::storage::models::{FileKind, FileRecord};
use crate::AppState;

// ============================================================================
// Template contexts
// ============================================================================

#[derive(Serialize)]
struct UploadPage {
    title: &'static str,
    max_upload: String,
}

#[derive(Serialize)]
struct AdminPage {
    title: &'static str,
    files: Vec<AdminRow>,
}

#[derive(Serialize)]
struct AdminRow {
    slug: String,
    url: String,
    original_name: String,
    file_type: &'static str,
    size: String,
    uploaded: String,
}

#[derive(Serialize)]
struct LoginPage {
    title: &'static str,
    next_json: String,
}

#[derive(Serialize)]
struct ViewerPage {
    title: String,
    original_name: String,
    file_url: String,
    excel: Option<ExcelView>,
}

#[derive(Serialize)]
struct ExcelView {
    error: Option<String>,
    show_tabs: bool,
    tabs: Vec<SheetTab>,
    empty: bool,
    headers: Vec<String>,
    rows: Vec<NumberedRow>,
}

#[derive(Serialize)]
struct SheetTab {
    index: usize,
    name: String,
    active: bool,
}

#[derive(Serialize)]
struct NumberedRow {
    number: usize,
    cells: Vec<String>,
}

#[derive(Serialize)]
struct NotFoundPage {
    title: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerParams {
    #[serde(default)]
    pub sheet: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_page(State(state): State<Arc<AppState>>) -> Response {
    render(
        &state,
        StatusCode::OK,
        pages::INDEX,
        &UploadPage {
            title: "Upload",
            max_upload: format_file_size(state.config.max_upload_size),
        },
    )
}

pub async fn admin_page(State(state): State<Arc<AppState>>) -> Response {
    let files = match state.registry.list_all() {
        Ok(files) => files,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list files for admin page");
            return internal_error();
        }
    };

    let files = files
        .into_iter()
        .map(|file| AdminRow {
            url: file.view_url(),
            file_type: file.file_type.as_str(),
            size: format_file_size(file.file_size),
            uploaded: file.uploaded_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            original_name: file.original_name,
            slug: file.slug,
        })
        .collect();

    render(
        &state,
        StatusCode::OK,
        pages::ADMIN,
        &AdminPage {
            title: "Files",
            files,
        },
    )
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    query: Option<AppQuery<LoginParams>>,
) -> Response {
    let next = query.and_then(|AppQuery(params)| params.next);
    let next = safe_next(next.as_deref());

    render(
        &state,
        StatusCode::OK,
        pages::LOGIN,
        &LoginPage {
            title: "Admin login",
            next_json: script_json(&next),
        },
    )
}

/// Route: GET /:slug
pub async fn viewer_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    query: Option<AppQuery<ViewerParams>>,
) -> Response {
    let file = match state.registry.lookup(&slug) {
        Ok(Some(file)) => file,
        Ok(None) => return not_found_page(&state),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "Failed to look up slug");
            return internal_error();
        }
    };

    let excel = match file.file_type {
        FileKind::Pdf => None,
        FileKind::Excel => {
            let selector = query.and_then(|AppQuery(params)| params.sheet);
            Some(excel_view(&state, &file, selector.as_deref()).await)
        }
    };

    render(
        &state,
        StatusCode::OK,
        pages::VIEWER,
        &ViewerPage {
            title: file.original_name.clone(),
            original_name: file.original_name,
            file_url: format!("/api/files/{}", file.slug),
            excel,
        },
    )
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    not_found_page(&state)
}

// ============================================================================
// Helpers
// ============================================================================

async fn excel_view(state: &AppState, file: &FileRecord, selector: Option<&str>) -> ExcelView {
    let sheets = match state.registry.read(file).await {
        Ok(data) => materialize_blocking(data).await,
        Err(e) => {
            tracing::error!(slug = %file.slug, error = %e, "Failed to read workbook bytes");
            Err("Failed to load file".to_string())
        }
    };

    match sheets {
        Ok(sheets) => sheet_view(sheets, selector),
        Err(message) => ExcelView {
            error: Some(message),
            show_tabs: false,
            tabs: Vec::new(),
            empty: false,
            headers: Vec::new(),
            rows: Vec::new(),
        },
    }
}

fn sheet_view(mut sheets: Vec<SheetData>, selector: Option<&str>) -> ExcelView {
    let active = spreadsheet::select_sheet(&sheets, selector);

    let tabs = sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| SheetTab {
            index: i,
            name: sheet.name.clone(),
            active: i == active,
        })
        .collect();

    let show_tabs = sheets.len() > 1;
    let Some(sheet) = (active < sheets.len()).then(|| sheets.swap_remove(active)) else {
        // A workbook with no sheets at all
        return ExcelView {
            error: None,
            show_tabs,
            tabs,
            empty: true,
            headers: Vec::new(),
            rows: Vec::new(),
        };
    };

    let empty = sheet.is_empty();
    let rows = sheet
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, cells)| NumberedRow {
            number: i + 1,
            cells,
        })
        .collect();

    ExcelView {
        error: None,
        show_tabs,
        tabs,
        empty,
        headers: sheet.headers,
        rows,
    }
}

/// JSON string literal safe to embed inside a `<script>` block.
fn script_json(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"/admin\"".to_string())
        .replace('<', "\\u003c")
}

fn render<T: Serialize>(state: &AppState, status: StatusCode, name: &str, data: &T) -> Response {
    match state.pages.render(name, data) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(template = name, error = %e, "Failed to render page");
            internal_error()
        }
    }
}

fn not_found_page(state: &AppState) -> Response {
    render(
        state,
        StatusCode::NOT_FOUND,
        pages::NOT_FOUND,
        &NotFoundPage { title: "Not found" },
    )
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>Internal server error</h1>"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, headers: &[&str], rows: &[&[&str]]) -> SheetData {
        SheetData {
            name: name.to_string(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn script_json_escapes_tags() {
        assert_eq!(script_json("/admin"), "\"/admin\"");
        assert_eq!(
            script_json("/</script>"),
            "\"/\\u003c/script>\""
        );
    }

    #[test]
    fn sheet_view_selects_and_numbers_rows() {
        let sheets = vec![
            sheet("Q1", &["Name", "Sales"], &[&["Alice", "100"], &["Bob", "200"]]),
            sheet("Q2", &["Name"], &[&["Carol"]]),
        ];

        let view = sheet_view(sheets, Some("0"));
        assert!(view.show_tabs);
        assert_eq!(view.tabs[1].index, 1);
        assert!(view.tabs[0].active);
        assert!(!view.tabs[1].active);
        assert_eq!(view.headers, vec!["Name", "Sales"]);
        assert_eq!(view.rows[1].number, 2);
        assert_eq!(view.rows[1].cells, vec!["Bob", "200"]);
    }

    #[test]
    fn single_sheet_hides_tabs() {
        let view = sheet_view(vec![sheet("Only", &[], &[])], None);
        assert!(!view.show_tabs);
        assert!(view.empty);
    }

    #[test]
    fn blank_header_row_is_not_empty() {
        let view = sheet_view(vec![sheet("Blank", &["", ""], &[])], None);
        assert!(!view.empty);
        assert_eq!(view.headers, vec!["", ""]);
    }
}
