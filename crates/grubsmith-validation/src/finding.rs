//! Findings produced by rule evaluation
//!
//! A [`Finding`] is the result of one rule firing against the current
//! snapshot. Findings are ephemeral: they are recomputed on every
//! validation pass and never persisted, only their rule id may end up in
//! the suppression store.

use serde::{Deserialize, Serialize};

/// Severity of a finding. The ordering is total: `Critical > High > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One rule's evaluation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identifier, e.g. `TIMEOUT_STYLE.hidden_no_timeout`
    pub rule_id: String,
    pub severity: Severity,
    /// Parameters the finding is about, in evaluation order, never empty
    pub params: Vec<String>,
    pub message: String,
    /// Whether the suppression store may hide this finding from display.
    /// Suppression never affects evaluation or the write gate either way.
    pub suppressible: bool,
}

impl Finding {
    pub fn affects(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total_with_critical_greatest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Low);
        assert_eq!(
            [Severity::High, Severity::Low, Severity::Critical]
                .iter()
                .max(),
            Some(&Severity::Critical)
        );
    }
}
