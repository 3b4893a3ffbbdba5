//! Grubsmith suppression store
//!
//! Persists the user's choices about what not to show: hidden parameters
//! and suppressed finding rule ids. Suppression is purely presentational.
//! The validation engine keeps evaluating every rule, and the write gate
//! ignores suppression entirely.

pub mod error;
pub mod store;

pub use error::{SuppressError, SuppressResult};
pub use store::{SuppressionSet, SuppressionStore};
