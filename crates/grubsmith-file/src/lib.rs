//! Reading, editing, and writing `/etc/default/grub`
//!
//! The format handled here is deliberately narrow: line-oriented
//! `KEY=value` entries with optional single or double quoting, blank lines,
//! and `#` comments. Writes go through a temp file and an atomic rename so
//! a half-written defaults file can never be left in place.

pub mod config_file;
pub mod error;

pub use config_file::{clip_comment, ConfigFile, ParamState};
pub use error::{FileError, FileResult};
