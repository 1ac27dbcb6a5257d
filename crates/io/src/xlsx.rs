// Excel file import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: reads one column of a reference sheet into a set of strings.
// Export: writes unmatched device rows as a plain table, one sheet per file.

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};
use serde_json::Value;

use devrecon_recon::model::OUTPUT_COLUMNS;
use devrecon_recon::{ReconError, ReferenceIdSet, UnmatchedRecord};

/// Integers at or above this magnitude lose precision as Excel numbers.
const EXCEL_PRECISION_LIMIT: f64 = 1e15;

/// Output column width, in characters.
const COLUMN_WIDTH: f64 = 28.0;

/// Longest text an xlsx cell can hold.
const MAX_CELL_CHARS: usize = 32_767;

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Load the set of ids found under `column` in the reference spreadsheet.
///
/// Reads `sheet` if given, otherwise the first sheet. The first row of the
/// used range is the header row. Empty cells are not added to the set.
pub fn load_reference_ids(
    path: &Path,
    column: &str,
    sheet: Option<&str>,
) -> Result<ReferenceIdSet, ReconError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ReconError::unreadable(path, format!("failed to open spreadsheet: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(ReconError::unreadable(
                    path,
                    format!("sheet '{name}' not found (available: {})", sheet_names.join(", ")),
                ));
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ReconError::unreadable(path, "spreadsheet contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReconError::unreadable(path, format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_to_string(c).unwrap_or_default()).collect(),
        None => Vec::new(),
    };

    let col_idx = headers.iter().position(|h| h == column).ok_or_else(|| {
        ReconError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
            found: headers.iter().filter(|h| !h.is_empty()).cloned().collect(),
        }
    })?;

    let mut ids = ReferenceIdSet::new();
    let mut cells = 0usize;
    for row in rows {
        if let Some(value) = row.get(col_idx).and_then(cell_to_string) {
            ids.insert(value);
            cells += 1;
        }
    }

    log::debug!(
        "sheet '{sheet_name}': {cells} non-empty cells under '{column}', {} distinct",
        ids.len()
    );
    Ok(ids)
}

/// String form of a cell, or `None` for an empty cell.
pub fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        // Integers stored as floats print without decimals
        Data::Float(n) => Some(if n.fract() == 0.0 && n.abs() < EXCEL_PRECISION_LIMIT {
            format!("{}", *n as i64)
        } else {
            format!("{}", n)
        }),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(e.to_string()),
        // Date serials compare as their numeric text
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write `records` as a single-sheet workbook at `path`.
///
/// Header row is [`OUTPUT_COLUMNS`]; there is no index column.
/// Returns the number of data rows written.
pub fn write_unmatched(records: &[UnmatchedRecord], path: &Path) -> Result<usize, ReconError> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (col, name) in OUTPUT_COLUMNS.iter().enumerate() {
        let col16 = col as u16;
        worksheet
            .write_string_with_format(0, col16, *name, &header_format)
            .map_err(|e| ReconError::write(path, format!("failed to write header: {e}")))?;
        worksheet
            .set_column_width(col16, COLUMN_WIDTH)
            .map_err(|e| ReconError::write(path, format!("failed to size column: {e}")))?;
    }

    for (i, record) in records.iter().enumerate() {
        let row32 = (i + 1) as u32;
        for (col, value) in record.cells().into_iter().enumerate() {
            write_cell(worksheet, row32, col as u16, value).map_err(|e| {
                ReconError::write(path, format!("failed to write cell ({row32}, {col}): {e}"))
            })?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| ReconError::write(path, format!("failed to save XLSX file: {e}")))?;

    Ok(records.len())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&Value>,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            worksheet.write_string(row, col, fit_cell_text(s, row, col))?;
        }
        Some(Value::Bool(b)) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if !exceeds_excel_precision(f) => {
                worksheet.write_number(row, col, f)?;
            }
            // Long integer ids go out as text to keep every digit
            _ => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        Some(other) => {
            let text = other.to_string();
            worksheet.write_string(row, col, fit_cell_text(&text, row, col))?;
        }
    }
    Ok(())
}

/// Clip `text` to the xlsx cell limit, warning when anything is dropped.
fn fit_cell_text(text: &str, row: u32, col: u16) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            log::warn!(
                "cell ({row}, {col}): {} characters truncated to {MAX_CELL_CHARS}",
                text.chars().count()
            );
            Cow::Borrowed(&text[..cut])
        }
    }
}

/// True if the integer part has more than 15 digits.
fn exceeds_excel_precision(n: f64) -> bool {
    n.is_finite() && n.trunc().abs() >= EXCEL_PRECISION_LIMIT
}
