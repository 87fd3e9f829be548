use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::materialize_blocking;
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::spreadsheet::{self, SheetData};
use crate::storage::models::FileKind;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SheetParams {
    #[serde(default)]
    pub sheet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SheetsResponse {
    pub active: usize,
    pub sheets: Vec<SheetData>,
}

/// Materialized contents of an Excel upload.
/// Route: GET /api/files/:slug/sheets
pub async fn get_sheets(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    AppQuery(params): AppQuery<SheetParams>,
) -> Result<Json<JSend<SheetsResponse>>, ApiError> {
    let file = state
        .registry
        .lookup(&slug)?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if file.file_type != FileKind::Excel {
        return Err(ApiError::bad_request("File is not an Excel workbook"));
    }

    let data = state.registry.read(&file).await?;
    let sheets = materialize_blocking(data)
        .await
        .map_err(ApiError::unprocessable)?;
    let active = spreadsheet::select_sheet(&sheets, params.sheet.as_deref());

    Ok(JSend::success(SheetsResponse { active, sheets }))
}
