//! The wired parameter catalog
//!
//! The table below is the single source of truth for which parameters the
//! editor manages. Order matters: it is the registration order the
//! validation engine evaluates field rules in, and the order parameters
//! appear within their category group.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::{AllowedValue, Category, IntBounds, ParameterSpec, ValueType};

const BOOL_VALUES: &[AllowedValue] = &[
    AllowedValue { value: "true", meaning: "Enabled" },
    AllowedValue { value: "false", meaning: "Disabled" },
];

const YN_VALUES: &[AllowedValue] = &[
    AllowedValue { value: "y", meaning: "Enabled" },
    AllowedValue { value: "n", meaning: "Disabled" },
];

static WIRED: &[ParameterSpec] = &[
    // Timeout & Menu
    ParameterSpec {
        name: "GRUB_TIMEOUT",
        value_type: ValueType::Integer,
        category: Category::TimeoutMenu,
        allowed: &[],
        bounds: Some(IntBounds { min: -1, max: 600 }),
        default: "5",
        format: Some(r"-?\d+"),
        brief: "Time (in seconds) to wait before booting the default entry.",
        guidance: "The timeout for the GRUB menu display. Set to 0 for instant boot, \
                   or -1 to wait indefinitely until a key is pressed.",
    },
    ParameterSpec {
        name: "GRUB_TIMEOUT_STYLE",
        value_type: ValueType::Enum,
        category: Category::TimeoutMenu,
        allowed: &[
            AllowedValue { value: "menu", meaning: "Show the full menu during the timeout period." },
            AllowedValue { value: "countdown", meaning: "Show a countdown display instead of the menu." },
            AllowedValue { value: "hidden", meaning: "Menu is hidden until a key is pressed." },
        ],
        bounds: None,
        default: "menu",
        format: None,
        brief: "How the timeout is displayed.",
        guidance: "Determines if the full menu, a countdown, or nothing is displayed \
                   during the timeout.",
    },
    ParameterSpec {
        name: "GRUB_HIDDEN_TIMEOUT",
        value_type: ValueType::Integer,
        category: Category::TimeoutMenu,
        allowed: &[],
        bounds: Some(IntBounds { min: 0, max: 600 }),
        default: "",
        format: Some(r"\d+"),
        brief: "Seconds to wait with the menu hidden before booting.",
        guidance: "Deprecated in favour of GRUB_TIMEOUT_STYLE=hidden, but still \
                   honoured. Must be a positive integer when the hidden style is in \
                   use, or the menu becomes unreachable.",
    },
    ParameterSpec {
        name: "GRUB_RECORDFAIL_TIMEOUT",
        value_type: ValueType::Integer,
        category: Category::TimeoutMenu,
        allowed: &[],
        bounds: Some(IntBounds { min: 0, max: 600 }),
        default: "30",
        format: Some(r"\d+"),
        brief: "Timeout (in seconds) used after a boot failure or crash.",
        guidance: "If a previous boot failed, GRUB waits this long to give the user \
                   a chance to recover. A low value speeds up boot after a known \
                   failure condition.",
    },
    // Boot Selection
    ParameterSpec {
        name: "GRUB_DEFAULT",
        value_type: ValueType::String,
        category: Category::BootSelection,
        allowed: &[
            AllowedValue { value: "0", meaning: "Boot the first entry in the menu (usually the latest kernel)." },
            AllowedValue { value: "saved", meaning: "Boot the entry selected in the previous session." },
        ],
        bounds: None,
        default: "0",
        format: Some(r"\d+|saved|gnulinux-advanced-\S+-\S+"),
        brief: "Which boot entry to select by default.",
        guidance: "Sets the default menu entry to boot. '0' is the first entry, \
                   'saved' remembers the last successful boot.",
    },
    ParameterSpec {
        name: "GRUB_SAVEDEFAULT",
        value_type: ValueType::Boolean,
        category: Category::BootSelection,
        allowed: BOOL_VALUES,
        bounds: None,
        default: "false",
        format: None,
        brief: "Remember the last booted entry as the new default.",
        guidance: "When 'true', the chosen entry is saved on every boot and used as \
                   the next default. Combine with GRUB_DEFAULT=saved, never with a \
                   numeric default.",
    },
    // Kernel Arguments
    ParameterSpec {
        name: "GRUB_CMDLINE_LINUX_DEFAULT",
        value_type: ValueType::QuotedList,
        category: Category::KernelArguments,
        allowed: &[
            AllowedValue { value: "nomodeset", meaning: "Disable kernel mode setting (often for broken graphics drivers)." },
            AllowedValue { value: "text", meaning: "Force text-only console." },
            AllowedValue { value: "systemd.show_status=1", meaning: "Show systemd startup messages." },
        ],
        bounds: None,
        default: "\"quiet splash\"",
        format: None,
        brief: "Arguments passed to the kernel when booting (normal mode).",
        guidance: "The most important line for common kernel options like 'quiet', \
                   'splash', 'nomodeset', etc. Ensure arguments are space-separated.",
    },
    ParameterSpec {
        name: "GRUB_CMDLINE_LINUX",
        value_type: ValueType::QuotedList,
        category: Category::KernelArguments,
        allowed: &[],
        bounds: None,
        default: "\"\"",
        format: None,
        brief: "Arguments passed to all kernel entries, including recovery.",
        guidance: "Kernel parameters applied to all entries, including recovery. Use \
                   this for necessary hardware options that must always be present.",
    },
    ParameterSpec {
        name: "GRUB_DISABLE_LINUX_UUID",
        value_type: ValueType::Boolean,
        category: Category::KernelArguments,
        allowed: BOOL_VALUES,
        bounds: None,
        default: "false",
        format: None,
        brief: "Use device names instead of UUIDs for root filesystems.",
        guidance: "UUIDs are generally safer, but non-standard setups (certain \
                   RAID/LVM layouts) or debugging may require device names.",
    },
    // Appearance
    ParameterSpec {
        name: "GRUB_GFXMODE",
        value_type: ValueType::String,
        category: Category::Appearance,
        allowed: &[
            AllowedValue { value: "auto", meaning: "Automatically determine best resolution." },
        ],
        bounds: None,
        default: "auto",
        format: None,
        brief: "The resolution for the graphical GRUB menu.",
        guidance: "The pixel resolution for the menu display, e.g. '1024x768'. \
                   'auto' is the safest choice. Comma-separated fallbacks are \
                   allowed.",
    },
    ParameterSpec {
        name: "GRUB_BACKGROUND",
        value_type: ValueType::Path,
        category: Category::Appearance,
        allowed: &[],
        bounds: None,
        default: "",
        format: None,
        brief: "Path to a background image file (PNG, JPG, TGA).",
        guidance: "Specifies a full path (e.g. /boot/grub/splash.png) to a custom \
                   image for the GRUB menu background.",
    },
    ParameterSpec {
        name: "GRUB_THEME",
        value_type: ValueType::Path,
        category: Category::Appearance,
        allowed: &[],
        bounds: None,
        default: "",
        format: None,
        brief: "Path to the directory containing a GRUB theme (optional).",
        guidance: "Specifies the full path to a directory containing a GRUB theme \
                   for a more polished graphical look.",
    },
    ParameterSpec {
        name: "GRUB_TERMINAL_INPUT",
        value_type: ValueType::Enum,
        category: Category::Appearance,
        allowed: &[
            AllowedValue { value: "console", meaning: "Use standard text input." },
            AllowedValue { value: "serial", meaning: "Enable serial console input (requires GRUB_SERIAL_COMMAND)." },
        ],
        bounds: None,
        default: "console",
        format: None,
        brief: "Sets the input device for the GRUB menu.",
        guidance: "Typically 'console'. Change to 'serial' if you are managing the \
                   system remotely via a serial connection.",
    },
    ParameterSpec {
        name: "GRUB_DISTRIBUTOR",
        value_type: ValueType::String,
        category: Category::Appearance,
        allowed: &[],
        bounds: None,
        default: "",
        format: None,
        brief: "Label used to identify your OS in the menu entries.",
        guidance: "The string used in the menu entry titles to denote the operating \
                   system (e.g. 'Ubuntu', 'Debian').",
    },
    // Security & Advanced
    ParameterSpec {
        name: "GRUB_ENABLE_CRYPTODISK",
        value_type: ValueType::Boolean,
        category: Category::SecurityAdvanced,
        allowed: YN_VALUES,
        bounds: None,
        default: "n",
        format: None,
        brief: "Enable support for booting from encrypted disks.",
        guidance: "If the root partition is LUKS-encrypted, this must be enabled and \
                   the config regenerated for the boot process to work.",
    },
    ParameterSpec {
        name: "GRUB_DISABLE_OS_PROBER",
        value_type: ValueType::Boolean,
        category: Category::SecurityAdvanced,
        allowed: BOOL_VALUES,
        bounds: None,
        default: "false",
        format: None,
        brief: "Toggle scanning for other OSes (os-prober).",
        guidance: "If set to 'true', GRUB will not automatically add entries for \
                   other operating systems found on separate partitions.",
    },
    ParameterSpec {
        name: "GRUB_DISABLE_RECOVERY",
        value_type: ValueType::Boolean,
        category: Category::SecurityAdvanced,
        allowed: BOOL_VALUES,
        bounds: None,
        default: "false",
        format: None,
        brief: "Disable generation of recovery mode menu entries.",
        guidance: "When 'true', no recovery entries appear in the menu. Keep them \
                   available unless there is a specific reason not to.",
    },
];

static CATALOG: Lazy<ParamCatalog> = Lazy::new(|| ParamCatalog::from_specs(WIRED));

/// Static registry of every recognized parameter
pub struct ParamCatalog {
    specs: &'static [ParameterSpec],
    index: HashMap<&'static str, usize>,
}

impl ParamCatalog {
    fn from_specs(specs: &'static [ParameterSpec]) -> Self {
        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            let previous = index.insert(spec.name, i);
            assert!(previous.is_none(), "duplicate catalog entry {}", spec.name);
        }
        ParamCatalog { specs, index }
    }

    /// The process-wide wired catalog
    pub fn wired() -> &'static ParamCatalog {
        &CATALOG
    }

    /// Look up a parameter by its full key. A miss is not an error for
    /// keys found in the config file; they are passed through unvalidated.
    pub fn lookup(&self, name: &str) -> Option<&ParameterSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All specs in registration order
    pub fn all(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter()
    }

    /// Specs grouped by category for menu display, preserving registration
    /// order within each group
    pub fn grouped(&self) -> Vec<(Category, Vec<&ParameterSpec>)> {
        let order = [
            Category::TimeoutMenu,
            Category::BootSelection,
            Category::KernelArguments,
            Category::Appearance,
            Category::SecurityAdvanced,
        ];
        order
            .into_iter()
            .map(|cat| {
                let members: Vec<_> =
                    self.specs.iter().filter(|s| s.category == cat).collect();
                (cat, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
