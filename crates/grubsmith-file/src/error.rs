//! Error types for the file layer

use std::path::PathBuf;
use thiserror::Error;

/// Result type for config file operations
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur reading or writing the defaults file
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown parameter {0}")]
    UnknownParameter(String),
}
