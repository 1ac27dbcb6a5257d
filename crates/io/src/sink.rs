// Output sink: one workbook, or numbered part files above the batch size.

use std::path::{Path, PathBuf};

use devrecon_recon::{ReconError, UnmatchedRecord};

use crate::xlsx;

/// One file written by [`write_output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartWritten {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SinkReport {
    /// Files in part order. Empty when there was nothing to write.
    pub parts: Vec<PartWritten>,
}

impl SinkReport {
    pub fn rows_written(&self) -> usize {
        self.parts.iter().map(|p| p.rows).sum()
    }

    pub fn is_split(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Sibling of `base` for part `n` (1-based): `out.xlsx` -> `out_part2.xlsx`.
pub fn part_path(base: &Path, n: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_part{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_part{n}"),
    };
    base.with_file_name(name)
}

/// Write `records` to `base`, splitting into `batch_size` chunks when needed.
///
/// Nothing is written for an empty slice. With at most `batch_size` records
/// the single file lands at `base`; otherwise parts go to [`part_path`]
/// siblings. A failing part aborts the run; earlier parts stay on disk.
pub fn write_output(
    records: &[UnmatchedRecord],
    base: &Path,
    batch_size: usize,
) -> Result<SinkReport, ReconError> {
    if batch_size == 0 {
        return Err(ReconError::Config("batch size must be at least 1".into()));
    }

    let mut report = SinkReport::default();
    if records.is_empty() {
        return Ok(report);
    }

    if records.len() <= batch_size {
        let rows = xlsx::write_unmatched(records, base)?;
        log::info!("wrote {rows} rows to {}", base.display());
        report.parts.push(PartWritten { path: base.to_path_buf(), rows });
        return Ok(report);
    }

    for (i, chunk) in records.chunks(batch_size).enumerate() {
        let path = part_path(base, i + 1);
        let rows = xlsx::write_unmatched(chunk, &path)?;
        log::info!("batch saved to {} ({rows} rows)", path.display());
        report.parts.push(PartWritten { path, rows });
    }

    Ok(report)
}
