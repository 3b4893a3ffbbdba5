//! The validation engine
//!
//! `evaluate` is deterministic and side-effect free: the same snapshot
//! (and the same probed layout) always yields the same findings in the
//! same order. Rules run in registration order; within one rule, hits are
//! ordered by parameter name ascending. Suppression is a display concern
//! only: the engine always returns the complete set.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use grubsmith_catalog::{ParamCatalog, SettingsSnapshot};

use crate::finding::{Finding, Severity};
use crate::probe::SystemProbe;
use crate::rules::{field_findings, EvalCtx, REGISTRY};

/// Rule-based validator for a settings snapshot
pub struct ValidationEngine {
    catalog: &'static ParamCatalog,
    probe: Arc<dyn SystemProbe>,
}

impl ValidationEngine {
    /// Create an engine over the wired catalog.
    ///
    /// Panics if any registered rule references a parameter the catalog
    /// does not know; that is a programming error caught at startup, not
    /// a runtime condition.
    pub fn new(catalog: &'static ParamCatalog, probe: Arc<dyn SystemProbe>) -> Self {
        for rule in REGISTRY {
            for &param in rule.params {
                assert!(
                    catalog.contains(param),
                    "rule {} references unknown parameter {param}",
                    rule.id
                );
            }
        }
        ValidationEngine { catalog, probe }
    }

    /// Evaluate every rule against the snapshot. Never fails: malformed
    /// values degrade to findings and the remaining rules still run.
    pub fn evaluate(&self, snapshot: &SettingsSnapshot) -> Vec<Finding> {
        let ctx = EvalCtx {
            catalog: self.catalog,
            snapshot,
            layout: self.probe.disk_layout(),
            probe: self.probe.as_ref(),
        };

        let mut findings = field_findings(&ctx);

        for rule in REGISTRY {
            let mut hits = (rule.check)(&ctx);
            hits.sort_by(|a, b| a.params.cmp(&b.params));
            for hit in hits {
                findings.push(Finding {
                    rule_id: rule.id.to_string(),
                    severity: rule.severity,
                    params: hit.params,
                    message: hit.message,
                    // Critical findings gate writes and stay visible.
                    suppressible: rule.severity != Severity::Critical,
                });
            }
        }

        debug!(count = findings.len(), "evaluated snapshot");
        findings
    }

    /// Whether any Critical finding is present (the write-gate condition)
    pub fn has_critical(findings: &[Finding]) -> bool {
        findings.iter().any(|f| f.severity == Severity::Critical)
    }
}

/// Apply the user's suppression choices for display. The raw evaluation
/// output is never filtered; automated checks see every finding.
pub fn filter_visible(
    findings: &[Finding],
    hidden_params: &BTreeSet<String>,
    suppressed_rules: &BTreeSet<String>,
) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| {
            let rule_suppressed = f.suppressible && suppressed_rules.contains(&f.rule_id);
            let param_hidden = f.params.iter().any(|p| hidden_params.contains(p));
            !rule_suppressed && !param_hidden
        })
        .cloned()
        .collect()
}

/// Order findings for display: severity descending, then registration
/// order (the stable sort preserves evaluation order within a severity).
pub fn display_order(findings: &[Finding]) -> Vec<Finding> {
    let mut ordered = findings.to_vec();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{DiskLayout, FixedProbe};

    fn engine() -> ValidationEngine {
        ValidationEngine::new(ParamCatalog::wired(), Arc::new(FixedProbe::plain()))
    }

    fn engine_with(layout: DiskLayout) -> ValidationEngine {
        ValidationEngine::new(
            ParamCatalog::wired(),
            Arc::new(FixedProbe::with_layout(layout)),
        )
    }

    fn snap(pairs: &[(&str, &str)]) -> SettingsSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn evaluation_is_deterministic() {
        let engine = engine();
        let snapshot = snap(&[
            ("GRUB_TIMEOUT", "0"),
            ("GRUB_TIMEOUT_STYLE", "menu"),
            ("GRUB_GFXMODE", "1234x777"),
        ]);
        let first = engine.evaluate(&snapshot);
        let second = engine.evaluate(&snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn hidden_style_without_hidden_timeout_is_critical() {
        let engine = engine();
        let snapshot = snap(&[("GRUB_TIMEOUT_STYLE", "hidden")]);
        let findings = engine.evaluate(&snapshot);
        let hit = findings
            .iter()
            .find(|f| f.rule_id == "TIMEOUT_STYLE.hidden_no_timeout")
            .expect("hidden timeout safety finding");
        assert_eq!(hit.severity, Severity::Critical);
        assert_eq!(hit.params, ["GRUB_HIDDEN_TIMEOUT", "GRUB_TIMEOUT_STYLE"]);
        assert!(!hit.suppressible);
    }

    #[test]
    fn hidden_style_with_positive_hidden_timeout_is_clean() {
        let engine = engine();
        let snapshot = snap(&[
            ("GRUB_TIMEOUT_STYLE", "hidden"),
            ("GRUB_HIDDEN_TIMEOUT", "3"),
            ("GRUB_TIMEOUT", "0"),
        ]);
        let findings = engine.evaluate(&snapshot);
        assert!(!ids(&findings).contains(&"TIMEOUT_STYLE.hidden_no_timeout"));
        assert!(!ids(&findings).contains(&"TIMEOUT.style_conflict"));
    }

    #[test]
    fn numeric_default_with_savedefault_is_critical_saved_is_not() {
        let engine = engine();

        let bad = snap(&[("GRUB_SAVEDEFAULT", "true"), ("GRUB_DEFAULT", "5")]);
        let findings = engine.evaluate(&bad);
        assert!(ids(&findings).contains(&"DEFAULT.numeric_with_savedefault"));

        let good = snap(&[("GRUB_SAVEDEFAULT", "true"), ("GRUB_DEFAULT", "saved")]);
        let findings = engine.evaluate(&good);
        assert!(!ids(&findings).contains(&"DEFAULT.numeric_with_savedefault"));
    }

    #[test]
    fn saved_default_without_savedefault_is_critical() {
        let engine = engine();

        let stale = snap(&[("GRUB_DEFAULT", "saved"), ("GRUB_SAVEDEFAULT", "false")]);
        let findings = engine.evaluate(&stale);
        let hit = findings
            .iter()
            .find(|f| f.rule_id == "DEFAULT.saved_without_savedefault")
            .expect("saved default coherence finding");
        assert_eq!(hit.severity, Severity::Critical);
        assert!(hit.affects("GRUB_SAVEDEFAULT"));

        // SAVEDEFAULT unset falls back to its default of false and still fires.
        let unset = snap(&[("GRUB_DEFAULT", "saved")]);
        assert!(ids(&engine.evaluate(&unset)).contains(&"DEFAULT.saved_without_savedefault"));

        let coherent = snap(&[("GRUB_DEFAULT", "saved"), ("GRUB_SAVEDEFAULT", "true")]);
        assert!(!ids(&engine.evaluate(&coherent)).contains(&"DEFAULT.saved_without_savedefault"));
    }

    #[test]
    fn zero_timeout_without_hidden_style_is_critical() {
        let engine = engine();
        let findings = engine.evaluate(&snap(&[("GRUB_TIMEOUT", "0")]));
        let hit = findings
            .iter()
            .find(|f| f.rule_id == "TIMEOUT.style_conflict")
            .expect("style conflict finding");
        assert_eq!(hit.severity, Severity::Critical);
    }

    #[test]
    fn positive_timeout_with_hidden_style_is_critical() {
        let engine = engine();
        let snapshot = snap(&[
            ("GRUB_TIMEOUT", "5"),
            ("GRUB_TIMEOUT_STYLE", "hidden"),
            ("GRUB_HIDDEN_TIMEOUT", "3"),
        ]);
        assert!(ids(&engine.evaluate(&snapshot)).contains(&"TIMEOUT.style_conflict"));
    }

    #[test]
    fn malformed_timeout_degrades_to_field_finding_without_aborting() {
        let engine = engine();
        let snapshot = snap(&[("GRUB_TIMEOUT", "infinity"), ("GRUB_SAVEDEFAULT", "maybe")]);
        let findings = engine.evaluate(&snapshot);
        assert!(ids(&findings).contains(&"TIMEOUT.bad_format"));
        assert!(ids(&findings).contains(&"SAVEDEFAULT.not_allowed"));
        // Later rules still ran.
        assert!(ids(&findings).contains(&"DISTRIBUTOR.empty"));
    }

    #[test]
    fn quiet_in_cmdline_linux_is_high() {
        let engine = engine();
        let snapshot = snap(&[("GRUB_CMDLINE_LINUX", "\"quiet splash nomodeset\"")]);
        let findings = engine.evaluate(&snapshot);
        assert!(ids(&findings).contains(&"CMDLINE_LINUX.recovery_noise"));
    }

    #[test]
    fn unquoted_cmdline_hits_order_by_param_name() {
        let engine = engine();
        let snapshot = snap(&[
            ("GRUB_CMDLINE_LINUX_DEFAULT", "quiet splash"),
            ("GRUB_CMDLINE_LINUX", "nomodeset text"),
        ]);
        let findings: Vec<_> = engine
            .evaluate(&snapshot)
            .into_iter()
            .filter(|f| f.rule_id == "CMDLINE_LINUX.unquoted")
            .collect();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].params, ["GRUB_CMDLINE_LINUX"]);
        assert_eq!(findings[1].params, ["GRUB_CMDLINE_LINUX_DEFAULT"]);
    }

    #[test]
    fn probe_driven_rules_follow_the_layout() {
        let dual_boot = engine_with(DiskLayout {
            has_other_os: true,
            luks_active: false,
            lvm_active: false,
        });
        let snapshot = snap(&[("GRUB_DISABLE_OS_PROBER", "true")]);
        assert!(ids(&dual_boot.evaluate(&snapshot)).contains(&"DISABLE_OS_PROBER.other_os_present"));

        let luks = engine_with(DiskLayout {
            has_other_os: false,
            luks_active: true,
            lvm_active: false,
        });
        let findings = luks.evaluate(&snap(&[]));
        assert!(ids(&findings).contains(&"CMDLINE_LINUX.luks_args_missing"));
        // Cryptodisk rule needs the opposite layout.
        let no_luks = engine();
        let findings = no_luks.evaluate(&snap(&[("GRUB_ENABLE_CRYPTODISK", "y")]));
        assert!(ids(&findings).contains(&"ENABLE_CRYPTODISK.no_luks"));
    }

    #[test]
    fn path_rule_is_high_and_respects_probe() {
        let probe = FixedProbe::plain().with_path("/boot/grub/themes/custom");
        let engine = ValidationEngine::new(ParamCatalog::wired(), Arc::new(probe));

        let missing = engine.evaluate(&snap(&[("GRUB_THEME", "/boot/grub/themes/other")]));
        let hit = missing
            .iter()
            .find(|f| f.rule_id == "THEME.path_missing")
            .expect("path finding");
        assert_eq!(hit.severity, Severity::High);

        let present = engine.evaluate(&snap(&[("GRUB_THEME", "/boot/grub/themes/custom")]));
        assert!(!ids(&present).contains(&"THEME.path_missing"));
    }

    #[test]
    fn gfxmode_outside_known_list_is_low() {
        let engine = engine();
        let findings = engine.evaluate(&snap(&[("GRUB_GFXMODE", "1024x768,777x111")]));
        let hit = findings
            .iter()
            .find(|f| f.rule_id == "GFXMODE.unknown_mode")
            .expect("gfxmode finding");
        assert_eq!(hit.severity, Severity::Low);
        assert!(hit.message.contains("777x111"));
    }

    #[test]
    fn suppression_filters_display_but_never_evaluation() {
        let engine = engine();
        let snapshot = snap(&[("GRUB_GFXMODE", "777x111")]);
        let findings = engine.evaluate(&snapshot);
        assert!(ids(&findings).contains(&"GFXMODE.unknown_mode"));

        let suppressed: BTreeSet<String> = ["GFXMODE.unknown_mode".to_string()].into();
        let visible = filter_visible(&findings, &BTreeSet::new(), &suppressed);
        assert!(!visible.iter().any(|f| f.rule_id == "GFXMODE.unknown_mode"));

        // Raw output unchanged on re-evaluation.
        let again = engine.evaluate(&snapshot);
        assert_eq!(findings, again);
    }

    #[test]
    fn hidden_param_filters_every_finding_touching_it() {
        let engine = engine();
        let findings = engine.evaluate(&snap(&[("GRUB_TIMEOUT", "0")]));
        let hidden: BTreeSet<String> = ["GRUB_TIMEOUT".to_string()].into();
        let visible = filter_visible(&findings, &hidden, &BTreeSet::new());
        assert!(!visible.iter().any(|f| f.affects("GRUB_TIMEOUT")));
    }

    #[test]
    fn critical_findings_ignore_rule_suppression() {
        let engine = engine();
        let findings = engine.evaluate(&snap(&[("GRUB_TIMEOUT", "0")]));
        let suppressed: BTreeSet<String> = ["TIMEOUT.style_conflict".to_string()].into();
        let visible = filter_visible(&findings, &BTreeSet::new(), &suppressed);
        // Critical findings are not suppressible, so they stay visible.
        assert!(visible.iter().any(|f| f.rule_id == "TIMEOUT.style_conflict"));
    }

    #[test]
    fn display_order_groups_by_severity_descending() {
        let engine = engine();
        let snapshot = snap(&[
            ("GRUB_TIMEOUT", "0"),
            ("GRUB_GFXMODE", "777x111"),
            ("GRUB_CMDLINE_LINUX", "\"quiet\""),
        ]);
        let ordered = display_order(&engine.evaluate(&snapshot));
        let severities: Vec<_> = ordered.iter().map(|f| f.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
    }
}
