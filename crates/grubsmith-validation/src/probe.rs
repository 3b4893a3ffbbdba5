//! Host inspection capability
//!
//! Cross-field rules need two facts about the machine: the rough disk
//! layout (another OS? LUKS? LVM?) and whether referenced boot paths
//! exist. Both come through the [`SystemProbe`] trait so tests can inject
//! a fixed fake instead of shelling out to `lsblk`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{debug, warn};

use grubsmith_catalog::unquote;

/// Windows recovery partition GUID, a strong dual-boot signal
const WIN_RECOVERY_GUID: &str = "de94bba4-06d9-4d40-a16a-bfd50179d6ac";
/// LVM partition type GUID
const LVM_GUID: &str = "e6d6d379-f507-44c2-a23c-238f2a3df928";

/// Directories a relative GRUB path may live under, tried in order
const PATH_BASES: &[&str] = &["/boot/grub", "/boot/grub2", "/usr/share/grub", "/"];

/// Heuristic disk layout flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskLayout {
    pub has_other_os: bool,
    pub luks_active: bool,
    pub lvm_active: bool,
}

/// Abstract host inspection used by the validation engine
pub trait SystemProbe: Send + Sync {
    /// Disk layout flags; expected to be cheap after the first call
    fn disk_layout(&self) -> DiskLayout;

    /// Whether a resolved path exists on this host
    fn path_exists(&self, path: &Path) -> bool;
}

/// Expand a raw path value into the candidate locations to check.
/// `$prefix` maps to the primary boot directory; relative paths are tried
/// against the usual boot directories.
pub fn resolve_candidates(raw: &str) -> Vec<PathBuf> {
    let value = unquote(raw);
    if value.is_empty() {
        return Vec::new();
    }
    let expanded = value.replace("$prefix", PATH_BASES[0]);
    if Path::new(&expanded).is_absolute() {
        vec![PathBuf::from(expanded)]
    } else {
        PATH_BASES
            .iter()
            .map(|base| Path::new(base).join(&expanded))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct LsblkReport {
    #[serde(default)]
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    #[serde(default)]
    fstype: Option<String>,
    #[serde(default)]
    parttype: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

/// Probe backed by `lsblk`. The scan runs once and is cached; any failure
/// degrades to an all-false layout rather than an error.
#[derive(Default)]
pub struct HostProbe {
    layout: OnceCell<DiskLayout>,
}

impl HostProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan() -> DiskLayout {
        let output = Command::new("lsblk")
            .args(["-o", "FSTYPE,PARTTYPE", "-J"])
            .output();

        let output = match output {
            Ok(out) if out.status.success() => out,
            Ok(out) => {
                warn!(status = ?out.status.code(), "lsblk failed; assuming plain layout");
                return DiskLayout::default();
            }
            Err(e) => {
                warn!(error = %e, "lsblk unavailable; assuming plain layout");
                return DiskLayout::default();
            }
        };

        match serde_json::from_slice::<LsblkReport>(&output.stdout) {
            Ok(report) => {
                let mut layout = DiskLayout::default();
                for device in &report.blockdevices {
                    inspect(device, &mut layout);
                }
                debug!(?layout, "disk layout probed");
                layout
            }
            Err(e) => {
                warn!(error = %e, "unparseable lsblk output; assuming plain layout");
                DiskLayout::default()
            }
        }
    }
}

fn inspect(device: &LsblkDevice, layout: &mut DiskLayout) {
    let fstype = device.fstype.as_deref().unwrap_or("").to_lowercase();
    let parttype = device.parttype.as_deref().unwrap_or("").to_lowercase();

    if matches!(fstype.as_str(), "ntfs" | "vfat" | "fat32" | "exfat")
        || parttype.contains(WIN_RECOVERY_GUID)
    {
        layout.has_other_os = true;
    }
    if matches!(fstype.as_str(), "crypto_luks" | "crypto_luks2") {
        layout.luks_active = true;
    }
    if fstype == "lvm2_member" || parttype.contains(LVM_GUID) {
        layout.lvm_active = true;
    }
    for child in &device.children {
        inspect(child, layout);
    }
}

impl SystemProbe for HostProbe {
    fn disk_layout(&self) -> DiskLayout {
        *self.layout.get_or_init(Self::scan)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Fixed probe for tests: a canned layout and an explicit set of paths
/// that are considered present.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    pub layout: DiskLayout,
    pub existing_paths: BTreeSet<PathBuf>,
}

impl FixedProbe {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: DiskLayout) -> Self {
        FixedProbe {
            layout,
            existing_paths: BTreeSet::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.existing_paths.insert(path.into());
        self
    }
}

impl SystemProbe for FixedProbe {
    fn disk_layout(&self) -> DiskLayout {
        self.layout
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.existing_paths.contains(path)
    }
}
