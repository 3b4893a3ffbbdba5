//! Error types for the suppression store

use std::path::PathBuf;
use thiserror::Error;

/// Result type for suppression operations
pub type SuppressResult<T> = Result<T, SuppressError>;

/// Errors that can occur loading or persisting suppression state.
/// A failed save is surfaced loudly; the toggle that triggered it is not
/// considered applied.
#[derive(Error, Debug)]
pub enum SuppressError {
    #[error("Suppression store unwritable at {path}: {source}")]
    PersistenceFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse suppression file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}
