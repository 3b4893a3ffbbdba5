//! Grubsmith backup store
//!
//! A checksum-addressed, timestamped archive of config file snapshots in a
//! per-user directory. Identity is the file name `YYYYMMDD.HHMMSS.CHECKSUM.TAG`;
//! creates never overwrite, restores verify content against the recorded
//! checksum, and the startup protocol seeds an empty archive with an `orig`
//! snapshot before the first edit.

pub mod error;
pub mod record;
pub mod store;

pub use error::{BackupError, BackupResult};
pub use record::{tag_is_valid, BackupRecord, BOOTSTRAP_TAG};
pub use store::{checksum, BackupStore, Bootstrap};
