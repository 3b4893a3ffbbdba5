//! Suppression persistence
//!
//! The on-disk format is a flat TOML table with exactly two keys, each a
//! comma-joined token list:
//!
//! ```toml
//! hidden_params = "GRUB_GFXMODE,GRUB_INIT_TUNE"
//! suppressed_rules = "GFXMODE.unknown_mode,DISTRIBUTOR.empty"
//! ```
//!
//! Saves are synchronous and atomic (temp file, then rename). A toggle is
//! only considered applied once its save completed; losing a suppression
//! choice is low-risk, a silent partial write is not.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SuppressError, SuppressResult};

const STORE_FILE: &str = "suppressions.toml";

/// The user's suppression choices. Suppressing a rule or hiding a
/// parameter only filters the displayed findings; evaluation and the
/// write gate always see everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionSet {
    pub hidden_params: BTreeSet<String>,
    pub suppressed_rules: BTreeSet<String>,
}

impl SuppressionSet {
    pub fn is_param_hidden(&self, name: &str) -> bool {
        self.hidden_params.contains(name)
    }

    pub fn is_rule_suppressed(&self, rule_id: &str) -> bool {
        self.suppressed_rules.contains(rule_id)
    }

    pub fn is_empty(&self) -> bool {
        self.hidden_params.is_empty() && self.suppressed_rules.is_empty()
    }
}

/// Serialized shape of the store file
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    hidden_params: String,
    #[serde(default)]
    suppressed_rules: String,
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(",")
}

fn split(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|tok| tok.trim())
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.to_string())
        .collect()
}

/// File-backed suppression store
pub struct SuppressionStore {
    path: PathBuf,
    set: SuppressionSet,
}

impl SuppressionStore {
    /// Load from `dir/suppressions.toml`; a missing file is the empty set.
    pub fn load(dir: impl AsRef<Path>) -> SuppressResult<Self> {
        let path = dir.as_ref().join(STORE_FILE);
        let set = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                SuppressError::PersistenceFailure {
                    path: path.clone(),
                    source: e,
                }
            })?;
            let file: StoreFile =
                toml::from_str(&content).map_err(|e| SuppressError::Corrupt {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            SuppressionSet {
                hidden_params: split(&file.hidden_params),
                suppressed_rules: split(&file.suppressed_rules),
            }
        } else {
            SuppressionSet::default()
        };
        Ok(SuppressionStore { path, set })
    }

    /// Default location under the per-user config directory
    pub fn load_default() -> SuppressResult<Self> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grubsmith");
        Self::load(dir)
    }

    pub fn set(&self) -> &SuppressionSet {
        &self.set
    }

    /// Persist the current state: temp file in place, atomic rename.
    pub fn save(&self) -> SuppressResult<()> {
        let file = StoreFile {
            hidden_params: join(&self.set.hidden_params),
            suppressed_rules: join(&self.set.suppressed_rules),
        };
        let content = toml::to_string(&file).expect("two flat string keys always serialize");

        let io_err = |source| SuppressError::PersistenceFailure {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let temp_path = self.path.with_extension("tmp");
        if let Err(e) = std::fs::write(&temp_path, &content) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }
        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(io_err(e));
        }
        debug!(path = %self.path.display(), "saved suppression state");
        Ok(())
    }

    /// Toggle a parameter in or out of the hidden set. Returns whether the
    /// parameter is hidden after the toggle. The change is rolled back if
    /// the save fails.
    pub fn toggle_hidden_param(&mut self, name: &str) -> SuppressResult<bool> {
        let now_hidden = if !self.set.hidden_params.remove(name) {
            self.set.hidden_params.insert(name.to_string());
            true
        } else {
            false
        };
        if let Err(e) = self.save() {
            // Undo so in-memory state matches what is on disk.
            if now_hidden {
                self.set.hidden_params.remove(name);
            } else {
                self.set.hidden_params.insert(name.to_string());
            }
            return Err(e);
        }
        Ok(now_hidden)
    }

    /// Toggle a rule id in or out of the suppressed set. Returns whether
    /// the rule is suppressed after the toggle.
    pub fn toggle_suppressed_rule(&mut self, rule_id: &str) -> SuppressResult<bool> {
        let now_suppressed = if !self.set.suppressed_rules.remove(rule_id) {
            self.set.suppressed_rules.insert(rule_id.to_string());
            true
        } else {
            false
        };
        if let Err(e) = self.save() {
            if now_suppressed {
                self.set.suppressed_rules.remove(rule_id);
            } else {
                self.set.suppressed_rules.insert(rule_id.to_string());
            }
            return Err(e);
        }
        Ok(now_suppressed)
    }

    /// Drop every suppression choice and persist the empty state
    pub fn clear_all(&mut self) -> SuppressResult<()> {
        let previous = std::mem::take(&mut self.set);
        if let Err(e) = self.save() {
            self.set = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Purge suppressed rule ids no registered rule produces any more.
    /// Saves only when something was actually removed.
    pub fn audit(&mut self, known_rule_ids: &BTreeSet<String>) -> SuppressResult<usize> {
        let orphans: Vec<String> = self
            .set
            .suppressed_rules
            .iter()
            .filter(|id| !known_rule_ids.contains(*id))
            .cloned()
            .collect();
        if orphans.is_empty() {
            return Ok(0);
        }
        for id in &orphans {
            self.set.suppressed_rules.remove(id);
        }
        if let Err(e) = self.save() {
            for id in &orphans {
                self.set.suppressed_rules.insert(id.clone());
            }
            return Err(e);
        }
        Ok(orphans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_empty_set() {
        let dir = tempdir().unwrap();
        let store = SuppressionStore::load(dir.path()).unwrap();
        assert!(store.set().is_empty());
    }

    #[test]
    fn toggles_persist_synchronously_and_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = SuppressionStore::load(dir.path()).unwrap();

        assert!(store.toggle_hidden_param("GRUB_GFXMODE").unwrap());
        assert!(store.toggle_suppressed_rule("GFXMODE.unknown_mode").unwrap());

        // A fresh load sees exactly the persisted state.
        let reloaded = SuppressionStore::load(dir.path()).unwrap();
        assert!(reloaded.set().is_param_hidden("GRUB_GFXMODE"));
        assert!(reloaded.set().is_rule_suppressed("GFXMODE.unknown_mode"));

        // Toggling again removes and persists the removal.
        assert!(!store.toggle_hidden_param("GRUB_GFXMODE").unwrap());
        let reloaded = SuppressionStore::load(dir.path()).unwrap();
        assert!(!reloaded.set().is_param_hidden("GRUB_GFXMODE"));
    }

    #[test]
    fn file_format_is_flat_comma_joined_lists() {
        let dir = tempdir().unwrap();
        let mut store = SuppressionStore::load(dir.path()).unwrap();
        store.toggle_hidden_param("GRUB_THEME").unwrap();
        store.toggle_hidden_param("GRUB_GFXMODE").unwrap();
        store.toggle_suppressed_rule("DISTRIBUTOR.empty").unwrap();

        let content = std::fs::read_to_string(dir.path().join(STORE_FILE)).unwrap();
        // Sorted, comma-joined, two keys.
        assert!(content.contains("hidden_params = \"GRUB_GFXMODE,GRUB_THEME\""));
        assert!(content.contains("suppressed_rules = \"DISTRIBUTOR.empty\""));
    }

    #[test]
    fn clear_all_empties_and_persists() {
        let dir = tempdir().unwrap();
        let mut store = SuppressionStore::load(dir.path()).unwrap();
        store.toggle_hidden_param("GRUB_THEME").unwrap();
        store.clear_all().unwrap();
        assert!(store.set().is_empty());
        assert!(SuppressionStore::load(dir.path()).unwrap().set().is_empty());
    }

    #[test]
    fn audit_purges_orphaned_rule_ids_only() {
        let dir = tempdir().unwrap();
        let mut store = SuppressionStore::load(dir.path()).unwrap();
        store.toggle_suppressed_rule("GFXMODE.unknown_mode").unwrap();
        store.toggle_suppressed_rule("OLD_RULE.retired").unwrap();

        let known: BTreeSet<String> = ["GFXMODE.unknown_mode".to_string()].into();
        store.audit(&known).unwrap();

        assert!(store.set().is_rule_suppressed("GFXMODE.unknown_mode"));
        assert!(!store.set().is_rule_suppressed("OLD_RULE.retired"));
        // And the purge is on disk.
        let reloaded = SuppressionStore::load(dir.path()).unwrap();
        assert!(!reloaded.set().is_rule_suppressed("OLD_RULE.retired"));
    }

    #[test]
    fn failed_save_rolls_back_and_removes_the_temp_file() {
        let dir = tempdir().unwrap();
        let mut store = SuppressionStore::load(dir.path()).unwrap();
        // A directory at the store path makes the rename fail.
        std::fs::create_dir(dir.path().join(STORE_FILE)).unwrap();

        let result = store.toggle_hidden_param("GRUB_THEME");
        assert!(matches!(result, Err(SuppressError::PersistenceFailure { .. })));
        assert!(store.set().is_empty());
        assert!(!dir.path().join("suppressions.tmp").exists());
    }

    #[test]
    fn corrupt_file_fails_loudly() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "not { toml").unwrap();
        let result = SuppressionStore::load(dir.path());
        assert!(matches!(result, Err(SuppressError::Corrupt { .. })));
    }
}
