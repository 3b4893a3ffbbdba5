//! Property-based tests for the backup archive
//!
//! The store's contract: a created record round-trips its bytes exactly,
//! identities never collide silently, and the archive cardinality after N
//! creates is N unless a create was explicitly rejected.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tempfile::tempdir;

use grubsmith_backup::{checksum, BackupError, BackupStore};

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..512)
}

fn tag_strategy() -> impl Strategy<Value = String> {
    "[-_A-Za-z0-9]{1,24}"
}

proptest! {
    /// Create then list: exactly one new record whose checksum matches the
    /// stored bytes, and restore returns byte-identical content.
    #[test]
    fn prop_create_list_restore_byte_identity(
        content in content_strategy(),
        tag in tag_strategy(),
    ) {
        let dir = tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();

        let record = store.create(&content, &tag).unwrap();
        prop_assert_eq!(&record.checksum, &checksum(&content));

        let listed = store.list().unwrap();
        prop_assert_eq!(listed.len(), 1);
        prop_assert_eq!(&listed[0], &record);

        prop_assert_eq!(store.restore(&record).unwrap(), content);
    }

    /// N creates with distinct tags yield N records, or fewer only via an
    /// explicit rejection. Nothing is ever silently overwritten.
    #[test]
    fn prop_archive_cardinality_matches_accepted_creates(
        content in content_strategy(),
        count in 1usize..8,
    ) {
        let dir = tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();

        let mut accepted = 0usize;
        for i in 0..count {
            match store.create(&content, &format!("snap{i}")) {
                Ok(_) => accepted += 1,
                Err(BackupError::DuplicateRecord { .. }) => {}
                Err(other) => return Err(TestCaseError::fail(other.to_string())),
            }
        }
        prop_assert_eq!(store.list().unwrap().len(), accepted);
    }
}

#[test]
fn tag_validation_is_enforced_at_create() {
    let dir = tempdir().unwrap();
    let store = BackupStore::open(dir.path()).unwrap();

    assert!(matches!(
        store.create(b"GRUB_TIMEOUT=5\n", "bad tag!"),
        Err(BackupError::InvalidTag { .. })
    ));
    let record = store.create(b"GRUB_TIMEOUT=5\n", "bad-tag_1").unwrap();
    assert_eq!(record.tag, "bad-tag_1");
}

#[test]
fn same_identity_create_is_rejected_never_overwritten() {
    let dir = tempdir().unwrap();
    let store = BackupStore::open(dir.path()).unwrap();

    let first = store.create(b"GRUB_TIMEOUT=5\n", "edit").unwrap();
    // Same content and tag again, immediately. Either the clock ticked and
    // it succeeds as a distinct identity, or it collides and is rejected;
    // the archive never loses the first record.
    match store.create(b"GRUB_TIMEOUT=5\n", "edit") {
        Ok(second) => {
            assert_ne!(first.file_name, second.file_name);
            assert_eq!(store.list().unwrap().len(), 2);
        }
        Err(BackupError::DuplicateRecord { .. }) => {
            assert_eq!(store.list().unwrap(), vec![first.clone()]);
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.restore(&first).unwrap(), b"GRUB_TIMEOUT=5\n");
}
