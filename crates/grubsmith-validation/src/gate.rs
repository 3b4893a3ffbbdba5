//! The write gate
//!
//! Before any destructive write the session re-evaluates the snapshot and
//! asks the gate. A write is blocked while any Critical finding remains,
//! independent of suppression state: suppression controls visibility,
//! never the gate. Blocking is normal control flow, not a crash; the user
//! may pass an explicit override.

use thiserror::Error;

use crate::finding::{Finding, Severity};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GateError {
    #[error("write blocked: {criticals} critical finding(s) unresolved (explicit override required)")]
    ValidationBlocked { criticals: usize },
}

/// Gate decision over a full, unfiltered evaluation result
pub struct WriteGate;

impl WriteGate {
    /// Check whether a write may proceed. `override_confirmed` is the
    /// user's explicit acknowledgement and lets the write through
    /// regardless of findings.
    pub fn check(findings: &[Finding], override_confirmed: bool) -> Result<(), GateError> {
        if override_confirmed {
            return Ok(());
        }
        let criticals = findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        if criticals > 0 {
            Err(GateError::ValidationBlocked { criticals })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            rule_id: "TEST.rule".to_string(),
            severity,
            params: vec!["GRUB_TIMEOUT".to_string()],
            message: "test".to_string(),
            suppressible: severity != Severity::Critical,
        }
    }

    #[test]
    fn critical_blocks_high_and_low_do_not() {
        let blocked = [finding(Severity::Critical), finding(Severity::Low)];
        assert_eq!(
            WriteGate::check(&blocked, false),
            Err(GateError::ValidationBlocked { criticals: 1 })
        );

        let allowed = [finding(Severity::High), finding(Severity::Low)];
        assert_eq!(WriteGate::check(&allowed, false), Ok(()));
    }

    #[test]
    fn explicit_override_passes_the_gate() {
        let blocked = [finding(Severity::Critical)];
        assert_eq!(WriteGate::check(&blocked, true), Ok(()));
    }

    #[test]
    fn empty_findings_pass() {
        assert_eq!(WriteGate::check(&[], false), Ok(()));
    }
}
