//! Parameter specification model
//!
//! A [`ParameterSpec`] describes one recognized `GRUB_*` key: its value
//! shape, allowed values, default, and the help text shown in the editor.
//! Specs are created once at process start from the wired table and never
//! mutated afterwards.

/// Shape of a parameter's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `true`/`false` (GRUB also accepts `y`/`n` for some keys)
    Boolean,
    /// Integer, optionally range-limited
    Integer,
    /// One of a fixed set of values
    Enum,
    /// Free-form string
    String,
    /// Path into the boot filesystem
    Path,
    /// Space-separated token list, normally quoted as a whole
    QuotedList,
}

/// Display grouping for the editor menu. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    TimeoutMenu,
    BootSelection,
    KernelArguments,
    Appearance,
    SecurityAdvanced,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::TimeoutMenu => write!(f, "Timeout & Menu"),
            Category::BootSelection => write!(f, "Boot Selection"),
            Category::KernelArguments => write!(f, "Kernel Arguments"),
            Category::Appearance => write!(f, "Appearance"),
            Category::SecurityAdvanced => write!(f, "Security & Advanced"),
        }
    }
}

/// One allowed value of an enum-typed parameter, with its meaning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedValue {
    pub value: &'static str,
    pub meaning: &'static str,
}

/// Inclusive integer bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntBounds {
    pub min: i64,
    pub max: i64,
}

/// Immutable description of one recognized parameter
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Full key, e.g. `GRUB_TIMEOUT`
    pub name: &'static str,
    pub value_type: ValueType,
    pub category: Category,
    /// Allowed values for `Enum` parameters; suggestions otherwise
    pub allowed: &'static [AllowedValue],
    /// Bounds for `Integer` parameters
    pub bounds: Option<IntBounds>,
    /// Value substituted when the key is absent from the file
    pub default: &'static str,
    /// Format pattern a present value must match (anchored by the engine)
    pub format: Option<&'static str>,
    /// One-line description for list views
    pub brief: &'static str,
    /// Longer help text, also written as a comment block when the editor
    /// appends a formerly absent parameter
    pub guidance: &'static str,
}

impl ParameterSpec {
    /// Key with the `GRUB_` prefix stripped, used in rule identifiers
    /// and compact displays.
    pub fn short_name(&self) -> &'static str {
        self.name.strip_prefix("GRUB_").unwrap_or(self.name)
    }
}
