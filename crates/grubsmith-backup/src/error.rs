//! Error types for the backup store

use std::path::PathBuf;
use thiserror::Error;

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur creating, restoring, or deleting backups
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Invalid backup tag {tag:?}: only letters, digits, '-' and '_' are allowed")]
    InvalidTag { tag: String },

    #[error("Backup {file_name} not found or its content no longer matches its checksum")]
    NotFound { file_name: String },

    #[error("A backup with identity {file_name} already exists; refusing to overwrite")]
    DuplicateRecord { file_name: String },

    #[error("Backup storage unwritable at {path}: {source}")]
    PersistenceFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}
