//! In-memory settings snapshot
//!
//! The session layer loads `/etc/default/grub` into a [`SettingsSnapshot`],
//! edits replace one entry at a time, and the validation engine always sees
//! the snapshot as one atomic mapping. Unknown keys are carried verbatim but
//! never validated.

use std::collections::BTreeMap;

use crate::catalog::ParamCatalog;

/// Strip one matching layer of surrounding quotes, if present.
pub fn unquote(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

/// Whether a raw value carries matching quote delimiters.
pub fn is_quoted(value: &str) -> bool {
    let v = value.trim();
    v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
}

/// GRUB booleans come in two dialects: `true`/`false` and `y`/`n`.
pub fn is_truthy(value: &str) -> bool {
    matches!(unquote(value), "true" | "y")
}

/// Mapping from parameter name to its current raw value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    values: BTreeMap<String, String>,
}

impl SettingsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value as present in the file, quotes included
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    /// Value with the catalog default substituted when the key is absent.
    /// Unknown keys have no default to fall back to.
    pub fn effective<'a>(&'a self, catalog: &'a ParamCatalog, name: &str) -> Option<&'a str> {
        match self.values.get(name) {
            Some(v) => Some(v.as_str()),
            None => catalog.lookup(name).map(|spec| spec.default),
        }
    }

    /// Whether the key is actually present in the snapshot (as opposed to
    /// being covered by a catalog default)
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Replace one entry, producing the next logical snapshot
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// All entries in key order, unknown keys included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for SettingsSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        SettingsSnapshot {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_matching_delimiters_only() {
        assert_eq!(unquote("\"quiet splash\""), "quiet splash");
        assert_eq!(unquote("'menu'"), "menu");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\"mismatched'"), "\"mismatched'");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn effective_falls_back_to_catalog_default() {
        let catalog = ParamCatalog::wired();
        let mut snap = SettingsSnapshot::new();
        assert_eq!(snap.effective(catalog, "GRUB_TIMEOUT"), Some("5"));
        snap.set("GRUB_TIMEOUT", "10");
        assert_eq!(snap.effective(catalog, "GRUB_TIMEOUT"), Some("10"));
        assert_eq!(snap.effective(catalog, "SOME_UNKNOWN"), None);
    }

    #[test]
    fn truthiness_accepts_both_grub_dialects() {
        assert!(is_truthy("true"));
        assert!(is_truthy("\"y\""));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("n"));
    }
}
