//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `devrecon` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                         |
//! |------|-----------------------------------------------------|
//! | 0    | Success (including "no unmatched records found")    |
//! | 2    | Usage or configuration error                        |
//! | 3    | Device JSON is malformed                            |
//! | 4    | Reference column missing                            |
//! | 5    | Input file unreadable                               |
//! | 6    | Output could not be written                         |

use devrecon_recon::ReconError;

/// Success - run completed, whether or not anything was unmatched.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments or configuration values.
pub const EXIT_USAGE: u8 = 2;

/// Device JSON is not an array of objects.
pub const EXIT_MALFORMED_INPUT: u8 = 3;

/// Reference sheet has no column with the expected header.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// Input file missing, corrupt, or in an unsupported format.
pub const EXIT_UNREADABLE_FILE: u8 = 5;

/// Output workbook or report could not be written.
pub const EXIT_WRITE: u8 = 6;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MalformedInput { .. } => EXIT_MALFORMED_INPUT,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::UnreadableFile { .. } => EXIT_UNREADABLE_FILE,
        ReconError::Write { .. } => EXIT_WRITE,
        ReconError::Config(_) => EXIT_USAGE,
    }
}
