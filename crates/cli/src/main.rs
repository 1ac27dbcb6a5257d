// devrecon CLI - report device records missing from a serial number sheet

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devrecon_cli::pipeline;
use devrecon_recon::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_JSON_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_REFERENCE_COLUMN,
    DEFAULT_XLSX_PATH,
};
use devrecon_recon::{ReconConfig, ReconError};

use exit_codes::{recon_exit_code, EXIT_SUCCESS, EXIT_WRITE};

#[derive(Parser)]
#[command(name = "devrecon")]
#[command(about = "List device records whose DeviceId is missing from a reference spreadsheet")]
#[command(version)]
#[command(after_help = "\
Examples:
  devrecon
  devrecon --json devices.json --xlsx serials.xlsx --output unmatched.xlsx
  devrecon --batch-size 500000 --output unmatched.xlsx
  devrecon --column 'Serial' --sheet Inventory --report run.json --quiet")]
struct Cli {
    /// Device records (JSON array of objects)
    #[arg(long, env = "DEVRECON_JSON", default_value = DEFAULT_JSON_PATH)]
    json: PathBuf,

    /// Reference spreadsheet (xlsx, xls, xlsb, ods)
    #[arg(long, env = "DEVRECON_XLSX", default_value = DEFAULT_XLSX_PATH)]
    xlsx: PathBuf,

    /// Output workbook; becomes <name>_partN.xlsx when split
    #[arg(long, short = 'o', env = "DEVRECON_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Max data rows per output file
    #[arg(long, env = "DEVRECON_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Header of the reference id column
    #[arg(long, env = "DEVRECON_COLUMN", default_value = DEFAULT_REFERENCE_COLUMN)]
    column: String,

    /// Reference sheet name (default: first sheet)
    #[arg(long, env = "DEVRECON_SHEET")]
    sheet: Option<String>,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Suppress progress notices
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Cli {
    fn to_config(&self) -> ReconConfig {
        ReconConfig {
            json_path: self.json.clone(),
            xlsx_path: self.xlsx.clone(),
            output_path: self.output.clone(),
            batch_size: self.batch_size,
            reference_column: self.column.clone(),
            sheet: self.sheet.clone(),
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("pass --column with the header that holds the serial numbers".to_string())
            }
            ReconError::MalformedInput { .. } => {
                Some("the device file must be a single JSON array of objects".to_string())
            }
            ReconError::Write { .. } => {
                Some("check that the output directory exists and is writable".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_run(cli: Cli) -> Result<(), CliError> {
    let config = cli.to_config();
    let report = pipeline::run(&config, cli.quiet).map_err(CliError::recon)?;

    if let Some(ref path) = cli.report {
        let json_str = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_WRITE,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        std::fs::write(path, json_str).map_err(|e| CliError {
            code: EXIT_WRITE,
            message: format!("cannot write report '{}': {e}", path.display()),
            hint: None,
        })?;
        if !cli.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cmd_run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
