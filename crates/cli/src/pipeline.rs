//! `devrecon` pipeline: reference load, device stream, reconcile, write.

use std::path::PathBuf;

use serde::Serialize;

use devrecon_io::{load_device_records, load_reference_ids, write_output};
use devrecon_recon::{try_find_unmatched, ReconConfig, ReconError, ReconMeta, ReconSummary};

/// One output file, as listed in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Machine-readable outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: ReconMeta,
    pub reference_ids: usize,
    pub summary: ReconSummary,
    /// Data rows across all output files.
    pub rows_written: usize,
    pub files: Vec<ReportFile>,
}

/// Run the whole pipeline for `config`.
///
/// Progress notices go to stderr unless `quiet`. The reference table is read
/// and closed before the device file is opened; device records are streamed
/// straight into the reconciler and only unmatched projections are kept.
pub fn run(config: &ReconConfig, quiet: bool) -> Result<RunReport, ReconError> {
    config.validate()?;
    let meta = ReconMeta::now();

    let notice = |msg: &str| {
        if !quiet {
            eprintln!("{msg}");
        }
    };

    notice("Loading Excel data...");
    let reference_ids = load_reference_ids(
        &config.xlsx_path,
        &config.reference_column,
        config.sheet.as_deref(),
    )?;
    notice(&format!(
        "Loaded {} reference IDs from {}",
        reference_ids.len(),
        config.xlsx_path.display()
    ));
    if reference_ids.is_empty() {
        log::warn!(
            "no ids under '{}' in {}; every device with an id will be unmatched",
            config.reference_column,
            config.xlsx_path.display()
        );
    }

    notice("Loading JSON data...");
    let records = load_device_records(&config.json_path)?;

    notice("Finding unmatched records...");
    let recon = try_find_unmatched(records, &reference_ids)?;
    let s = &recon.summary;
    notice(&format!(
        "Loaded {} device records: {} matched, {} without DeviceId, {} unmatched",
        s.total_records, s.matched, s.skipped_without_id, s.unmatched,
    ));

    let mut files = Vec::new();
    let mut rows_written = 0;
    if recon.unmatched.is_empty() {
        notice("No unmatched records found.");
    } else {
        notice(&format!("Saving {} unmatched records to Excel...", recon.unmatched.len()));
        let sink = write_output(&recon.unmatched, &config.output_path, config.batch_size)?;
        if sink.is_split() {
            for part in &sink.parts {
                notice(&format!("Batch saved to {}", part.path.display()));
            }
        } else {
            notice(&format!("Unmatched records saved to {}", config.output_path.display()));
        }
        rows_written = sink.rows_written();
        files = sink
            .parts
            .into_iter()
            .map(|p| ReportFile { path: p.path, rows: p.rows })
            .collect();
    }

    Ok(RunReport {
        meta,
        reference_ids: reference_ids.len(),
        summary: recon.summary,
        rows_written,
        files,
    })
}
