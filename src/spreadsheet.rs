//! Spreadsheet materialization: workbook bytes in, display-ready sheets out.
//!
//! Every cell is coerced to text. The first row of each sheet is treated as
//! the header row; a sheet without any rows has neither headers nor rows,
//! which is a different state from a header row made of empty strings.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Failed to read sheet '{name}': {source}")]
    Sheet {
        name: String,
        #[source]
        source: calamine::Error,
    },
}

/// One sheet of a workbook, ready to be rendered as a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// True only for a sheet with no rows at all.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Parse a workbook (xlsx, xls, xlsb or ods) into one [`SheetData`] per sheet,
/// in workbook order. Any failure aborts the whole workbook.
pub fn materialize(bytes: &[u8]) -> Result<Vec<SheetData>, MaterializeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|source| MaterializeError::Sheet {
                name: name.clone(),
                source,
            })?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();
        let rows = rows.collect();

        sheets.push(SheetData {
            name,
            headers,
            rows,
        });
    }

    Ok(sheets)
}

/// Pick the sheet to show first.
///
/// A selector whose leading integer is an in-range index wins (`"1abc"` and
/// `"1.5"` both mean 1); otherwise the first sheet whose name matches
/// case-insensitively; otherwise sheet 0.
pub fn select_sheet(sheets: &[SheetData], selector: Option<&str>) -> usize {
    let Some(selector) = selector else {
        return 0;
    };

    if let Some(index) = leading_index(selector) {
        if index < sheets.len() {
            return index;
        }
    }

    let wanted = selector.to_lowercase();
    sheets
        .iter()
        .position(|sheet| sheet.name.to_lowercase() == wanted)
        .unwrap_or(0)
}

/// The integer at the start of `selector`, after leading whitespace and an
/// optional sign. Trailing text is ignored. Negative values are not indexes.
fn leading_index(selector: &str) -> Option<usize> {
    let trimmed = selector.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    // Overflow means "too large for any workbook"
    let value = rest[..digits_end].parse::<usize>().unwrap_or(usize::MAX);
    if negative && value != 0 {
        return None;
    }
    Some(value)
}

/// Text shown for a single cell.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => number_text(*f),
        Data::Bool(b) => b.to_string(),
        // Raw serial number, no date formatting
        Data::DateTime(dt) => number_text(dt.as_f64()),
        Data::Error(e) => e.to_string(),
    }
}

fn number_text(f: f64) -> String {
    if f == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    f.to_string()
}
