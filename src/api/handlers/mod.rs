mod auth;
mod files;
mod health;
mod pages;
mod sheets;

pub use auth::{login, logout};
pub use files::{delete_file, list_files, serve_file, upload_file};
pub use health::health;
pub use pages::{admin_page, login_page, not_found, upload_page, viewer_page};
pub use sheets::get_sheets;

use crate::spreadsheet::{self, SheetData};

/// Parse workbook bytes off the async runtime. Errors come back as the
/// single message shown to the user.
async fn materialize_blocking(data: bytes::Bytes) -> Result<Vec<SheetData>, String> {
    match tokio::task::spawn_blocking(move || spreadsheet::materialize(&data)).await {
        Ok(Ok(sheets)) => Ok(sheets),
        Ok(Err(e)) => {
            tracing::info!(error = %e, "Could not materialize workbook");
            Err(e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Workbook parsing task failed");
            Err("Failed to load file".to_string())
        }
    }
}
