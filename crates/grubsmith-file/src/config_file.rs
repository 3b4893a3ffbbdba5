//! The defaults file model
//!
//! On read, every line is associated with the parameter it sets (commented
//! out or not). A parameter ends up in one of three states: set, commented
//! out, or absent. On write, edits are applied in place, superseded
//! duplicate lines are commented out, and formerly absent parameters are
//! appended at the end preceded by their catalog help text. Lines that set
//! nothing the editor knows about round-trip verbatim.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use grubsmith_catalog::{ParamCatalog, SettingsSnapshot};

use crate::error::{FileError, FileResult};

static PARAM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#)?\s*(GRUB(?:_[A-Z0-9]+)+)\s*=(.*)$").expect("param line regex"));

/// State of one parameter as read from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamState {
    /// Uncommented `KEY=value` line; value kept verbatim, quotes included
    Set(String),
    /// Only `#KEY=value` lines; the would-be value is retained
    CommentedOut(String),
    /// No line mentions the key
    Absent,
}

/// Pending edit against one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Assign(String),
    CommentOut,
}

#[derive(Debug)]
struct ParamEntry {
    /// Line currently owning the parameter, if any
    line: Option<usize>,
    state: ParamState,
}

/// Parsed, editable view of `/etc/default/grub`
pub struct ConfigFile {
    path: PathBuf,
    lines: Vec<String>,
    /// Which parameter each line sets, once duplicates are resolved
    line_param: Vec<Option<String>>,
    /// Earlier duplicate lines to be commented out on the next write
    superseded: Vec<usize>,
    params: BTreeMap<String, ParamEntry>,
    edits: BTreeMap<String, Edit>,
}

impl ConfigFile {
    /// Parse file content. Keys the catalog does not know are adopted so
    /// their values still reach the snapshot, unvalidated.
    pub fn parse(path: impl Into<PathBuf>, content: &str, catalog: &ParamCatalog) -> Self {
        let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
        let mut file = ConfigFile {
            path: path.into(),
            line_param: vec![None; lines.len()],
            superseded: Vec::new(),
            params: catalog
                .all()
                .map(|spec| {
                    (
                        spec.name.to_string(),
                        ParamEntry {
                            line: None,
                            state: ParamState::Absent,
                        },
                    )
                })
                .collect(),
            edits: BTreeMap::new(),
            lines,
        };
        file.scan(catalog);
        file
    }

    /// Read and parse the file at `path`
    pub fn load(path: impl Into<PathBuf>, catalog: &ParamCatalog) -> FileResult<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| FileError::Read {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self::parse(path, &content, catalog))
    }

    fn scan(&mut self, catalog: &ParamCatalog) {
        for i in 0..self.lines.len() {
            let line = self.lines[i].clone();
            let Some(caps) = PARAM_LINE.captures(&line) else {
                continue;
            };
            let is_comment = caps.get(1).is_some();
            let name = caps[2].to_string();
            let value = clip_comment(&caps[3]).to_string();

            if !catalog.contains(&name) && !self.params.contains_key(&name) {
                debug!(param = %name, "adopting unknown parameter from file");
                self.params.insert(
                    name.clone(),
                    ParamEntry {
                        line: None,
                        state: ParamState::Absent,
                    },
                );
            }

            let entry = self.params.get_mut(&name).expect("entry just ensured");

            if let Some(prev) = entry.line {
                // Duplicate. A commented line never displaces a live one;
                // a live line displaces whatever came before.
                if is_comment && matches!(entry.state, ParamState::Set(_)) {
                    continue;
                }
                if matches!(entry.state, ParamState::Set(_)) {
                    warn!(param = %name, line = prev + 1, "duplicate assignment; last one wins");
                    self.superseded.push(prev);
                }
                self.line_param[prev] = None;
            }

            entry.line = Some(i);
            entry.state = if is_comment {
                ParamState::CommentedOut(value)
            } else {
                ParamState::Set(value)
            };
            self.line_param[i] = Some(name);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// State as read from the file, before pending edits
    pub fn state(&self, name: &str) -> ParamState {
        self.params
            .get(name)
            .map(|e| e.state.clone())
            .unwrap_or(ParamState::Absent)
    }

    /// Stage a new value for a parameter
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> FileResult<()> {
        if !self.params.contains_key(name) {
            return Err(FileError::UnknownParameter(name.to_string()));
        }
        self.edits.insert(name.to_string(), Edit::Assign(value.into()));
        Ok(())
    }

    /// Stage commenting a parameter out (reset to the built-in default)
    pub fn comment_out(&mut self, name: &str) -> FileResult<()> {
        if !self.params.contains_key(name) {
            return Err(FileError::UnknownParameter(name.to_string()));
        }
        self.edits.insert(name.to_string(), Edit::CommentOut);
        Ok(())
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn discard_edits(&mut self) {
        self.edits.clear();
    }

    /// Current logical snapshot: file state with pending edits applied.
    /// Commented-out and absent parameters contribute nothing; the
    /// validation engine substitutes catalog defaults for those.
    pub fn snapshot(&self) -> SettingsSnapshot {
        let mut snap: SettingsSnapshot = self
            .params
            .iter()
            .filter_map(|(name, entry)| match &entry.state {
                ParamState::Set(v) => Some((name.clone(), v.clone())),
                _ => None,
            })
            .collect();
        for (name, edit) in &self.edits {
            match edit {
                Edit::Assign(v) => snap.set(name.clone(), v.clone()),
                Edit::CommentOut => {
                    snap.remove(name);
                }
            }
        }
        snap
    }

    /// Render the file with all edits applied
    pub fn render(&self, catalog: &ParamCatalog) -> String {
        let mut out: Vec<String> = Vec::with_capacity(self.lines.len() + 8);

        for (i, line) in self.lines.iter().enumerate() {
            if self.superseded.contains(&i) {
                out.push(format!("#{line}"));
                continue;
            }
            let Some(name) = &self.line_param[i] else {
                out.push(line.clone());
                continue;
            };
            let entry = &self.params[name];
            match self.edits.get(name) {
                None => out.push(line.clone()),
                Some(Edit::Assign(value)) => out.push(format!("{name}={value}")),
                Some(Edit::CommentOut) => match entry.state {
                    ParamState::Set(_) => out.push(format!("#{line}")),
                    _ => out.push(line.clone()),
                },
            }
        }

        // Formerly absent parameters get appended with their help text.
        for (name, edit) in &self.edits {
            let Edit::Assign(value) = edit else { continue };
            if !matches!(self.params[name].state, ParamState::Absent) {
                continue;
            }
            out.push(String::new());
            if let Some(spec) = catalog.lookup(name) {
                for wrapped in wrap_comment(spec.guidance, 68) {
                    out.push(format!("# {wrapped}"));
                }
            }
            out.push(format!("{name}={value}"));
        }

        let mut text = out.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Write the rendered file atomically: temp file in the destination
    /// directory, then rename over the original. A failure at any point
    /// leaves the original file untouched.
    pub fn write_to(&self, path: &Path, catalog: &ParamCatalog) -> FileResult<()> {
        let content = self.render(catalog);
        let temp_path = path.with_extension("tmp");

        if let Err(e) = std::fs::write(&temp_path, &content) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(FileError::Write {
                path: temp_path,
                source: e,
            });
        }

        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(FileError::Write {
                path: path.to_path_buf(),
                source: e,
            });
        }
        debug!(path = %path.display(), "wrote defaults file");
        Ok(())
    }

    /// Write back to the path the file was loaded from
    pub fn write(&self, catalog: &ParamCatalog) -> FileResult<()> {
        self.write_to(&self.path, catalog)
    }
}

/// Extract the value portion of a line, clipping any comment that starts
/// outside quotes.
///
/// `5 # ten seconds` becomes `5`; `"has #hash" # note` becomes `"has #hash"`.
pub fn clip_comment(value_part: &str) -> &str {
    let trimmed = value_part.trim();
    let mut in_single = false;
    let mut in_double = false;
    for (i, ch) in trimmed.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => return trimmed[..i].trim_end(),
            _ => {}
        }
    }
    trimmed
}

/// Greedy word wrap for appended guidance comments
fn wrap_comment(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
