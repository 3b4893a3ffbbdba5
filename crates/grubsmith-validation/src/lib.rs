//! Grubsmith validation engine
//!
//! Evaluates a settings snapshot against the parameter catalog plus a set
//! of cross-field rules, producing ordered findings with severities. The
//! engine is deterministic and side-effect free; host facts (disk layout,
//! path existence) come in through the [`SystemProbe`] capability so tests
//! can inject fakes. The write gate blocks destructive writes while any
//! Critical finding remains, regardless of what the user suppressed.

pub mod engine;
pub mod finding;
pub mod gate;
pub mod probe;
mod rules;

pub use engine::{display_order, filter_visible, ValidationEngine};
pub use finding::{Finding, Severity};
pub use gate::{GateError, WriteGate};
pub use probe::{resolve_candidates, DiskLayout, FixedProbe, HostProbe, SystemProbe};
