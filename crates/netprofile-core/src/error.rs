use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by netprofile.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log stream broke part-way through (corrupt gzip, non UTF-8 text).
    #[error("Failed to decode file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The summary table could not be created or appended to.
    #[error("Failed to write summary {path}: {source}")]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device log directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No device log files were found to process.
    #[error("No device log files found in {0}")]
    NoDeviceFiles(PathBuf),

    /// A JSON document could not be produced.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the netprofile crates.
pub type Result<T> = std::result::Result<T, ProfileError>;
