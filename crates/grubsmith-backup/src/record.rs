//! Backup identity
//!
//! A backup's identity is its file name: `YYYYMMDD.HHMMSS.CHECKSUM.TAG`,
//! where CHECKSUM is the first 8 lowercase hex digits of the SHA-256 of the
//! stored bytes and TAG is a user-chosen label (or `orig` for the snapshot
//! taken on first run). The tag character class excludes `.`, so the file
//! name parses unambiguously.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tag used for the snapshot taken the first time an empty store sees the
/// config file.
pub const BOOTSTRAP_TAG: &str = "orig";

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-_A-Za-z0-9]+$").expect("tag pattern is valid"));

static FILE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{8})\.(\d{6})\.([0-9a-f]{8})\.([-_A-Za-z0-9]+)$")
        .expect("file name pattern is valid")
});

/// Whether a tag is usable in a backup identity
pub fn tag_is_valid(tag: &str) -> bool {
    TAG_PATTERN.is_match(tag)
}

/// One archived snapshot, identified by its file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Second-resolution creation time
    pub timestamp: NaiveDateTime,
    /// First 8 lowercase hex digits of the SHA-256 of the stored bytes
    pub checksum: String,
    /// User-chosen label, or [`BOOTSTRAP_TAG`]
    pub tag: String,
    /// `YYYYMMDD.HHMMSS.CHECKSUM.TAG`
    pub file_name: String,
}

impl BackupRecord {
    /// Compose a record from its parts. The caller has already validated
    /// the tag and lowercased the checksum.
    pub(crate) fn compose(timestamp: NaiveDateTime, checksum: &str, tag: &str) -> BackupRecord {
        let file_name = format!(
            "{}.{}.{}.{}",
            timestamp.format("%Y%m%d"),
            timestamp.format("%H%M%S"),
            checksum,
            tag
        );
        BackupRecord {
            timestamp,
            checksum: checksum.to_string(),
            tag: tag.to_string(),
            file_name,
        }
    }

    /// Parse a directory entry name back into a record. Files that do not
    /// match the identity layout are not backups and yield `None`.
    pub fn parse(file_name: &str) -> Option<BackupRecord> {
        let caps = FILE_NAME_PATTERN.captures(file_name)?;
        let stamp = format!("{} {}", &caps[1], &caps[2]);
        let timestamp = NaiveDateTime::parse_from_str(&stamp, "%Y%m%d %H%M%S").ok()?;
        Some(BackupRecord {
            timestamp,
            checksum: caps[3].to_string(),
            tag: caps[4].to_string(),
            file_name: file_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    #[test]
    fn compose_and_parse_round_trip() {
        let record = BackupRecord::compose(stamp(), "0badc0de", "pre-theme");
        assert_eq!(record.file_name, "20260314.092653.0badc0de.pre-theme");
        assert_eq!(BackupRecord::parse(&record.file_name), Some(record));
    }

    #[test]
    fn foreign_files_do_not_parse() {
        assert!(BackupRecord::parse("suppressions.toml").is_none());
        assert!(BackupRecord::parse("20260314.092653.DEADBEEF.orig").is_none());
        assert!(BackupRecord::parse("20260314.092653.0badc0de.bad tag").is_none());
        assert!(BackupRecord::parse("20260314.092653.0badc0de.orig.tmp").is_none());
    }

    #[test]
    fn tag_character_class() {
        assert!(tag_is_valid("orig"));
        assert!(tag_is_valid("bad-tag_1"));
        assert!(!tag_is_valid("bad tag!"));
        assert!(!tag_is_valid(""));
        assert!(!tag_is_valid("dotted.tag"));
    }
}
