use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ReconError {
    /// Device JSON is not an array of objects, or is syntactically broken.
    MalformedInput { path: PathBuf, message: String },
    /// Reference sheet has no column with the expected header.
    MissingColumn { path: PathBuf, column: String, found: Vec<String> },
    /// Input file missing, corrupt, or not in a readable format.
    UnreadableFile { path: PathBuf, message: String },
    /// Output destination cannot be created or saved.
    Write { path: PathBuf, message: String },
    /// Invalid configuration value.
    Config(String),
}

impl ReconError {
    pub fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::MalformedInput { path: path.to_path_buf(), message: message.into() }
    }

    pub fn unreadable(path: &Path, message: impl Into<String>) -> Self {
        Self::UnreadableFile { path: path.to_path_buf(), message: message.into() }
    }

    pub fn write(path: &Path, message: impl Into<String>) -> Self {
        Self::Write { path: path.to_path_buf(), message: message.into() }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput { path, message } => {
                write!(f, "malformed input '{}': {message}", path.display())
            }
            Self::MissingColumn { path, column, found } => {
                if found.is_empty() {
                    write!(f, "'{}': missing column '{column}' (sheet has no header row)", path.display())
                } else {
                    write!(
                        f,
                        "'{}': missing column '{column}' (found: {})",
                        path.display(),
                        found.join(", ")
                    )
                }
            }
            Self::UnreadableFile { path, message } => {
                write!(f, "cannot read '{}': {message}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "cannot write '{}': {message}", path.display())
            }
            Self::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
