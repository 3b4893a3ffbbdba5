//! The rule registry
//!
//! Rules are data, not a class hierarchy: each cross-field rule is a tagged
//! record with an id, a fixed severity, the parameters it reads, and a
//! predicate over the evaluation context. Evaluation iterates the
//! registered sequence in order, so finding order is explicit and
//! testable. Field rules run first, walking the catalog in registration
//! order; a malformed value yields a finding and never aborts the pass.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use grubsmith_catalog::{is_truthy, unquote, ParamCatalog, SettingsSnapshot, ValueType};

use crate::finding::{Finding, Severity};
use crate::probe::{resolve_candidates, DiskLayout, SystemProbe};

const TIMEOUT: &str = "GRUB_TIMEOUT";
const TIMEOUT_STYLE: &str = "GRUB_TIMEOUT_STYLE";
const HIDDEN_TIMEOUT: &str = "GRUB_HIDDEN_TIMEOUT";
const DEFAULT: &str = "GRUB_DEFAULT";
const SAVEDEFAULT: &str = "GRUB_SAVEDEFAULT";
const CMDLINE: &str = "GRUB_CMDLINE_LINUX";
const CMDLINE_DEFAULT: &str = "GRUB_CMDLINE_LINUX_DEFAULT";
const OS_PROBER: &str = "GRUB_DISABLE_OS_PROBER";
const CRYPTODISK: &str = "GRUB_ENABLE_CRYPTODISK";
const GFXMODE: &str = "GRUB_GFXMODE";
const DISTRIBUTOR: &str = "GRUB_DISTRIBUTOR";

/// Video modes most firmware handles; anything else earns a Low finding
const KNOWN_GOOD_MODES: &[&str] = &[
    "auto", "keep", "640x480", "800x600", "1024x768", "1280x720", "1280x1024", "1920x1080",
];

/// Everything a rule predicate may look at
pub(crate) struct EvalCtx<'a> {
    pub catalog: &'static ParamCatalog,
    pub snapshot: &'a SettingsSnapshot,
    pub layout: DiskLayout,
    pub probe: &'a dyn SystemProbe,
}

impl EvalCtx<'_> {
    /// Raw value as present in the snapshot, quotes included
    fn raw(&self, name: &str) -> Option<&str> {
        self.snapshot.get(name)
    }

    /// Effective value: snapshot value or catalog default
    fn eff(&self, name: &str) -> Option<&str> {
        self.snapshot.effective(self.catalog, name)
    }

    /// Unquoted effective value, empty string when neither is available
    fn effq(&self, name: &str) -> &str {
        self.eff(name).map(unquote).unwrap_or("")
    }

    fn truthy(&self, name: &str) -> bool {
        self.eff(name).map(is_truthy).unwrap_or(false)
    }

    /// Unset for rule purposes: absent from the snapshot, or present but
    /// empty once unquoted
    fn unset(&self, name: &str) -> bool {
        self.raw(name).map(|v| unquote(v).is_empty()).unwrap_or(true)
    }
}

/// A rule predicate reports its hits; the engine stamps on the rule's
/// identity and severity.
pub(crate) struct RuleHit {
    pub params: Vec<String>,
    pub message: String,
}

impl RuleHit {
    fn one(param: &str, message: impl Into<String>) -> Vec<RuleHit> {
        vec![RuleHit {
            params: vec![param.to_string()],
            message: message.into(),
        }]
    }

    fn pair(a: &str, b: &str, message: impl Into<String>) -> Vec<RuleHit> {
        vec![RuleHit {
            params: vec![a.to_string(), b.to_string()],
            message: message.into(),
        }]
    }
}

pub(crate) struct CrossRule {
    pub id: &'static str,
    pub severity: Severity,
    /// Catalog parameters the rule reads; checked at engine construction
    pub params: &'static [&'static str],
    pub check: fn(&EvalCtx) -> Vec<RuleHit>,
}

/// Cross-field rules in registration order. Evaluation and display tie
/// ordering both derive from this sequence.
pub(crate) static REGISTRY: &[CrossRule] = &[
    CrossRule {
        id: "DEFAULT.numeric_with_savedefault",
        severity: Severity::Critical,
        params: &[DEFAULT, SAVEDEFAULT],
        check: check_numeric_with_savedefault,
    },
    CrossRule {
        id: "DEFAULT.saved_without_savedefault",
        severity: Severity::Critical,
        params: &[DEFAULT, SAVEDEFAULT],
        check: check_saved_without_savedefault,
    },
    CrossRule {
        id: "TIMEOUT_STYLE.hidden_no_timeout",
        severity: Severity::Critical,
        params: &[HIDDEN_TIMEOUT, TIMEOUT_STYLE],
        check: check_hidden_no_timeout,
    },
    CrossRule {
        id: "TIMEOUT.style_conflict",
        severity: Severity::Critical,
        params: &[TIMEOUT, TIMEOUT_STYLE],
        check: check_timeout_style_conflict,
    },
    CrossRule {
        id: "CMDLINE_LINUX.recovery_noise",
        severity: Severity::High,
        params: &[CMDLINE],
        check: check_recovery_noise,
    },
    CrossRule {
        id: "CMDLINE_LINUX.unquoted",
        severity: Severity::High,
        params: &[CMDLINE, CMDLINE_DEFAULT],
        check: check_unquoted_cmdline,
    },
    CrossRule {
        id: "DISABLE_OS_PROBER.other_os_present",
        severity: Severity::High,
        params: &[OS_PROBER],
        check: check_prober_disabled_with_other_os,
    },
    CrossRule {
        id: "ENABLE_CRYPTODISK.no_luks",
        severity: Severity::High,
        params: &[CRYPTODISK],
        check: check_cryptodisk_without_luks,
    },
    CrossRule {
        id: "GFXMODE.unknown_mode",
        severity: Severity::Low,
        params: &[GFXMODE],
        check: check_gfxmode,
    },
    CrossRule {
        id: "CMDLINE_LINUX.luks_args_missing",
        severity: Severity::High,
        params: &[CMDLINE],
        check: check_luks_args_missing,
    },
    CrossRule {
        id: "CMDLINE_LINUX.lvm_args_missing",
        severity: Severity::High,
        params: &[CMDLINE],
        check: check_lvm_args_missing,
    },
    CrossRule {
        id: "DISTRIBUTOR.empty",
        severity: Severity::Low,
        params: &[DISTRIBUTOR],
        check: check_distributor_empty,
    },
    CrossRule {
        id: "DISABLE_OS_PROBER.no_other_os",
        severity: Severity::Low,
        params: &[OS_PROBER],
        check: check_prober_enabled_without_other_os,
    },
];

fn check_numeric_with_savedefault(ctx: &EvalCtx) -> Vec<RuleHit> {
    let default = ctx.effq(DEFAULT);
    if ctx.truthy(SAVEDEFAULT)
        && !default.is_empty()
        && default.chars().all(|c| c.is_ascii_digit())
    {
        RuleHit::pair(
            DEFAULT,
            SAVEDEFAULT,
            "GRUB_DEFAULT is numeric while GRUB_SAVEDEFAULT is true; a reordered \
             menu silently changes which entry gets saved. Use GRUB_DEFAULT=saved.",
        )
    } else {
        Vec::new()
    }
}

fn check_saved_without_savedefault(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.effq(DEFAULT) == "saved" && !ctx.truthy(SAVEDEFAULT) {
        RuleHit::pair(
            DEFAULT,
            SAVEDEFAULT,
            "GRUB_DEFAULT=saved has no effect unless GRUB_SAVEDEFAULT is true; the \
             saved entry is never recorded and boot falls back to the first entry.",
        )
    } else {
        Vec::new()
    }
}

fn check_hidden_no_timeout(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.effq(TIMEOUT_STYLE) != "hidden" {
        return Vec::new();
    }
    let zero_or_unset =
        ctx.unset(HIDDEN_TIMEOUT) || matches!(ctx.effq(HIDDEN_TIMEOUT), "0" | "0.0");
    if zero_or_unset {
        RuleHit::pair(
            HIDDEN_TIMEOUT,
            TIMEOUT_STYLE,
            "GRUB_TIMEOUT_STYLE is hidden but GRUB_HIDDEN_TIMEOUT is unset or zero; \
             the menu can become unreachable. Set a positive hidden timeout.",
        )
    } else {
        Vec::new()
    }
}

fn check_timeout_style_conflict(ctx: &EvalCtx) -> Vec<RuleHit> {
    let style = ctx.effq(TIMEOUT_STYLE);
    let Ok(timeout) = ctx.effq(TIMEOUT).parse::<f64>() else {
        // Not a number; the field rule already reported it.
        return Vec::new();
    };
    if timeout == 0.0 && style != "hidden" {
        return RuleHit::pair(
            TIMEOUT,
            TIMEOUT_STYLE,
            "GRUB_TIMEOUT=0 boots instantly with no chance to reach the menu; give \
             a positive timeout or deliberately switch to the hidden style.",
        );
    }
    if timeout > 0.0 && style == "hidden" {
        return RuleHit::pair(
            TIMEOUT,
            TIMEOUT_STYLE,
            "GRUB_TIMEOUT is positive but the hidden style never shows the menu \
             during the wait; use menu or countdown so the wait is visible.",
        );
    }
    Vec::new()
}

fn check_recovery_noise(ctx: &EvalCtx) -> Vec<RuleHit> {
    let value = ctx.effq(CMDLINE);
    let noisy: Vec<&str> = value
        .split_whitespace()
        .filter(|tok| matches!(*tok, "quiet" | "splash"))
        .collect();
    if noisy.is_empty() {
        Vec::new()
    } else {
        RuleHit::one(
            CMDLINE,
            format!(
                "'{}' in GRUB_CMDLINE_LINUX also silences recovery and single-user \
                 boots; it belongs in GRUB_CMDLINE_LINUX_DEFAULT.",
                noisy.join("' and '")
            ),
        )
    }
}

fn check_unquoted_cmdline(ctx: &EvalCtx) -> Vec<RuleHit> {
    // Parameter name ascending: GRUB_CMDLINE_LINUX sorts first.
    [CMDLINE, CMDLINE_DEFAULT]
        .iter()
        .filter_map(|&param| {
            let raw = ctx.raw(param)?;
            if raw.trim().contains(' ') && !grubsmith_catalog::is_quoted(raw) {
                Some(RuleHit {
                    params: vec![param.to_string()],
                    message: format!(
                        "{param} contains spaces but lacks matching quote delimiters; \
                         the shell will truncate it at the first space."
                    ),
                })
            } else {
                None
            }
        })
        .collect()
}

fn check_prober_disabled_with_other_os(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.truthy(OS_PROBER) && ctx.layout.has_other_os {
        RuleHit::one(
            OS_PROBER,
            "os-prober is disabled but another operating system was detected; its \
             boot entries will be missing from the menu.",
        )
    } else {
        Vec::new()
    }
}

fn check_cryptodisk_without_luks(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.truthy(CRYPTODISK) && !ctx.layout.luks_active {
        RuleHit::one(
            CRYPTODISK,
            "GRUB_ENABLE_CRYPTODISK is on but no LUKS volume was detected; this \
             slows boot for no benefit and may indicate a stale setting.",
        )
    } else {
        Vec::new()
    }
}

fn check_gfxmode(ctx: &EvalCtx) -> Vec<RuleHit> {
    let value = ctx.effq(GFXMODE).to_lowercase();
    if value.is_empty() {
        return Vec::new();
    }
    let unknown: Vec<&str> = value
        .split(',')
        .map(|m| m.trim())
        .filter(|m| !m.is_empty() && !KNOWN_GOOD_MODES.contains(m))
        .collect();
    if unknown.is_empty() {
        Vec::new()
    } else {
        RuleHit::one(
            GFXMODE,
            format!(
                "mode '{}' is not in the known-good list; if the firmware rejects \
                 it the menu may render blank. 'auto' is the safe choice.",
                unknown.join("', '")
            ),
        )
    }
}

fn check_luks_args_missing(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.layout.luks_active && !ctx.effq(CMDLINE).contains("rd.luks.uuid=") {
        RuleHit::one(
            CMDLINE,
            "a LUKS volume is active but GRUB_CMDLINE_LINUX has no rd.luks.uuid= \
             argument; early boot may fail to unlock the root device.",
        )
    } else {
        Vec::new()
    }
}

fn check_lvm_args_missing(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.layout.lvm_active && !ctx.effq(CMDLINE).contains("rd.lvm.vg=") {
        RuleHit::one(
            CMDLINE,
            "LVM is active but GRUB_CMDLINE_LINUX has no rd.lvm.vg= argument; the \
             volume group may not be activated during early boot.",
        )
    } else {
        Vec::new()
    }
}

fn check_distributor_empty(ctx: &EvalCtx) -> Vec<RuleHit> {
    if ctx.effq(DISTRIBUTOR).is_empty() {
        RuleHit::one(
            DISTRIBUTOR,
            "GRUB_DISTRIBUTOR is empty; menu entries will carry a generic title.",
        )
    } else {
        Vec::new()
    }
}

fn check_prober_enabled_without_other_os(ctx: &EvalCtx) -> Vec<RuleHit> {
    if !ctx.truthy(OS_PROBER) && !ctx.layout.has_other_os {
        RuleHit::one(
            OS_PROBER,
            "no other operating system was detected; setting \
             GRUB_DISABLE_OS_PROBER=true skips a pointless scan at config time.",
        )
    } else {
        Vec::new()
    }
}

/// Compiled format patterns, anchored, built once from the catalog
static FORMAT_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    ParamCatalog::wired()
        .all()
        .filter_map(|spec| {
            spec.format.map(|fmt| {
                let re = Regex::new(&format!("^(?:{fmt})$"))
                    .unwrap_or_else(|e| panic!("bad format pattern for {}: {e}", spec.name));
                (spec.name, re)
            })
        })
        .collect()
});

/// Field rules: each present value checked against its own spec. Absent
/// parameters take their catalog default, which is valid by construction,
/// so only raw values are inspected here.
pub(crate) fn field_findings(ctx: &EvalCtx) -> Vec<Finding> {
    let mut findings = Vec::new();

    for spec in ctx.catalog.all() {
        let Some(raw) = ctx.raw(spec.name) else {
            continue;
        };
        let value = unquote(raw);
        if value.is_empty() {
            // An empty assignment reads as unset; cross rules handle the
            // cases where that matters.
            continue;
        }
        let short = spec.short_name();
        let mut report = |kind: &str, severity: Severity, message: String| {
            findings.push(Finding {
                rule_id: format!("{short}.{kind}"),
                severity,
                params: vec![spec.name.to_string()],
                message,
                suppressible: true,
            });
        };

        match spec.value_type {
            ValueType::QuotedList => {
                // Free-form token lists; quoting is a cross-field concern.
            }
            ValueType::Boolean | ValueType::Enum => {
                if !spec.allowed.iter().any(|a| a.value == value) {
                    report(
                        "not_allowed",
                        Severity::High,
                        format!("value '{value}' is not one of the allowed values"),
                    );
                }
            }
            ValueType::Integer => {
                if let Some(re) = FORMAT_PATTERNS.get(spec.name) {
                    if !re.is_match(value) {
                        report(
                            "bad_format",
                            Severity::High,
                            format!("value '{value}' is not a valid integer"),
                        );
                        continue;
                    }
                }
                match value.parse::<i64>() {
                    Ok(n) => {
                        if let Some(bounds) = spec.bounds {
                            if n < bounds.min || n > bounds.max {
                                report(
                                    "out_of_range",
                                    Severity::High,
                                    format!(
                                        "value {n} is outside the expected range {}..={}",
                                        bounds.min, bounds.max
                                    ),
                                );
                            }
                        }
                    }
                    Err(_) => report(
                        "bad_format",
                        Severity::High,
                        format!("value '{value}' is not a valid integer"),
                    ),
                }
            }
            ValueType::String => {
                if let Some(re) = FORMAT_PATTERNS.get(spec.name) {
                    if !re.is_match(value) {
                        report(
                            "bad_format",
                            Severity::High,
                            format!("value '{value}' does not match the expected format"),
                        );
                    }
                }
            }
            ValueType::Path => {
                // A missing path is High, never Critical: the referenced
                // file may simply not be synced to /boot yet.
                let exists = resolve_candidates(raw)
                    .iter()
                    .any(|p| ctx.probe.path_exists(p));
                if !exists {
                    report(
                        "path_missing",
                        Severity::High,
                        format!("path '{value}' was not found under the usual boot directories"),
                    );
                }
            }
        }
    }

    findings
}
