//! Snapshot archive
//!
//! Backups live as plain files in a per-user directory, one file per
//! snapshot, named by identity (see [`BackupRecord`]). The store never
//! overwrites: a create whose identity file already exists is rejected, so
//! two successful creates can never silently clobber each other. Restore
//! re-hashes the stored bytes and refuses to hand back content that no
//! longer matches its recorded checksum.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};
use crate::record::{tag_is_valid, BackupRecord, BOOTSTRAP_TAG};

/// First 8 lowercase hex digits of the SHA-256 of `bytes`. Pure; the same
/// digest the store embeds in backup identities.
pub fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..4])
}

/// Outcome of the startup protocol, for the session layer to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// The store was empty; an `orig` snapshot was taken unconditionally.
    Seeded(BackupRecord),
    /// The current file matches at least one known record, newest first.
    /// A further snapshot is optional.
    Matched {
        checksum: String,
        records: Vec<BackupRecord>,
    },
    /// The file changed since the last known backup; the session layer
    /// should offer or require a snapshot before edits proceed.
    Changed { checksum: String },
}

/// Directory-backed backup archive
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    /// Open the archive at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> BackupResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| BackupError::PersistenceFailure {
            path: dir.clone(),
            source: e,
        })?;
        Ok(BackupStore { dir })
    }

    /// Default location under the per-user config directory
    pub fn open_default() -> BackupResult<Self> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grubsmith")
            .join("backups");
        Self::open(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, record: &BackupRecord) -> PathBuf {
        self.dir.join(&record.file_name)
    }

    /// All records in the archive, newest first. Foreign files in the
    /// directory are ignored.
    pub fn list(&self) -> BackupResult<Vec<BackupRecord>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| BackupError::PersistenceFailure {
            path: self.dir.clone(),
            source: e,
        })?;
        let mut records: Vec<BackupRecord> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| BackupRecord::parse(&entry.file_name().to_string_lossy()))
            .collect();
        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        debug!(count = records.len(), "listed backup archive");
        Ok(records)
    }

    /// All records whose checksum matches, newest first. May be empty;
    /// distinct tags with the same checksum coexist as distinct records.
    pub fn find_by_checksum(&self, checksum: &str) -> BackupResult<Vec<BackupRecord>> {
        let wanted = checksum.to_ascii_lowercase();
        let mut records = self.list()?;
        records.retain(|r| r.checksum == wanted);
        Ok(records)
    }

    /// Archive `bytes` under `tag` at the current time.
    pub fn create(&self, bytes: &[u8], tag: &str) -> BackupResult<BackupRecord> {
        let now = Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        self.create_at(bytes, tag, now)
    }

    /// Identity is second-resolution: a second create within the same
    /// second with the same content and tag collides and is rejected
    /// rather than overwritten.
    pub(crate) fn create_at(
        &self,
        bytes: &[u8],
        tag: &str,
        timestamp: NaiveDateTime,
    ) -> BackupResult<BackupRecord> {
        if !tag_is_valid(tag) {
            return Err(BackupError::InvalidTag {
                tag: tag.to_string(),
            });
        }
        let record = BackupRecord::compose(timestamp, &checksum(bytes), tag);
        let path = self.record_path(&record);
        if path.exists() {
            return Err(BackupError::DuplicateRecord {
                file_name: record.file_name,
            });
        }

        let io_err = |source| BackupError::PersistenceFailure {
            path: path.clone(),
            source,
        };
        // Tag chars exclude '.', so the tmp name cannot collide with an
        // identity name.
        let temp_path = self.dir.join(format!("{}.tmp", record.file_name));
        if let Err(e) = std::fs::write(&temp_path, bytes) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }
        if let Err(e) = std::fs::rename(&temp_path, &path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }
        info!(file = %record.file_name, "created backup");
        Ok(record)
    }

    /// Read a record's bytes back, verifying them against the recorded
    /// checksum. Missing or corrupted content is `NotFound`.
    pub fn restore(&self, record: &BackupRecord) -> BackupResult<Vec<u8>> {
        let path = self.record_path(record);
        let bytes = std::fs::read(&path).map_err(|_| BackupError::NotFound {
            file_name: record.file_name.clone(),
        })?;
        if checksum(&bytes) != record.checksum {
            warn!(file = %record.file_name, "backup content does not match its checksum");
            return Err(BackupError::NotFound {
                file_name: record.file_name.clone(),
            });
        }
        info!(file = %record.file_name, "restored backup content");
        Ok(bytes)
    }

    /// Remove a record from the archive.
    pub fn delete(&self, record: &BackupRecord) -> BackupResult<()> {
        let path = self.record_path(record);
        std::fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackupError::NotFound {
                    file_name: record.file_name.clone(),
                }
            } else {
                BackupError::PersistenceFailure { path, source: e }
            }
        })?;
        info!(file = %record.file_name, "deleted backup");
        Ok(())
    }

    /// Startup protocol. An empty store is seeded with an `orig` snapshot
    /// of the current bytes; otherwise the current checksum is compared
    /// against known records and the outcome reported. Whether a further
    /// snapshot is taken on `Matched`/`Changed` is the session layer's
    /// policy, not the store's.
    pub fn bootstrap(&self, current_bytes: &[u8]) -> BackupResult<Bootstrap> {
        if self.list()?.is_empty() {
            let record = self.create(current_bytes, BOOTSTRAP_TAG)?;
            return Ok(Bootstrap::Seeded(record));
        }
        let sum = checksum(current_bytes);
        let records = self.find_by_checksum(&sum)?;
        if records.is_empty() {
            Ok(Bootstrap::Changed { checksum: sum })
        } else {
            Ok(Bootstrap::Matched {
                checksum: sum,
                records,
            })
        }
    }
}
