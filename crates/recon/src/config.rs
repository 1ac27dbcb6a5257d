use std::path::PathBuf;

use crate::error::ReconError;

pub const DEFAULT_JSON_PATH: &str = "input.json";
pub const DEFAULT_XLSX_PATH: &str = "input.xlsx";
pub const DEFAULT_OUTPUT_PATH: &str = "output.xlsx";
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;
pub const DEFAULT_REFERENCE_COLUMN: &str = "Combined ID Serial Number";

/// Data rows that fit in one xlsx worksheet (1,048,576 rows minus the header).
pub const MAX_ROWS_PER_SHEET: usize = 1_048_575;

/// Settings for one run. Built once at startup and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconConfig {
    /// Source of device records (JSON array).
    pub json_path: PathBuf,
    /// Source of reference ids (spreadsheet).
    pub xlsx_path: PathBuf,
    /// Destination base path for the unmatched rows.
    pub output_path: PathBuf,
    /// Max data rows per output file.
    pub batch_size: usize,
    /// Header of the reference id column.
    pub reference_column: String,
    /// Reference sheet; first sheet when `None`.
    pub sheet: Option<String>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from(DEFAULT_JSON_PATH),
            xlsx_path: PathBuf::from(DEFAULT_XLSX_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            reference_column: DEFAULT_REFERENCE_COLUMN.to_string(),
            sheet: None,
        }
    }
}

impl ReconConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.batch_size == 0 {
            return Err(ReconError::Config("batch size must be at least 1".into()));
        }

        if self.batch_size > MAX_ROWS_PER_SHEET {
            return Err(ReconError::Config(format!(
                "batch size {} exceeds the xlsx limit of {MAX_ROWS_PER_SHEET} data rows",
                self.batch_size
            )));
        }

        if self.reference_column.trim().is_empty() {
            return Err(ReconError::Config("reference column name is empty".into()));
        }

        let is_xlsx = self
            .output_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx {
            return Err(ReconError::Config(format!(
                "output path '{}' must end in .xlsx",
                self.output_path.display()
            )));
        }

        Ok(())
    }
}
