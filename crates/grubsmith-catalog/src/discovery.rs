//! System parameter discovery
//!
//! Parses the installed GRUB info pages to learn which `GRUB_*` parameters
//! this system actually supports. Results are cached as JSON in the user
//! config directory so the subprocess runs at most once a week.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};

const CACHE_FILE: &str = "system-params.json";
const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

static PARAM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(GRUB_[A-Z_0-9]+)").expect("param token regex"));

/// Outcome of one discovery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryState {
    /// Parameters were extracted from the info pages
    Ok,
    /// `info` missing, timed out, or GRUB docs not installed
    NoDocs,
    /// `info` ran but no parameters could be parsed
    CannotParse,
}

/// Cached discovery result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryCache {
    pub params: BTreeSet<String>,
    pub state: DiscoveryState,
    pub unixtime: u64,
}

/// Discovers and caches the set of system-supported parameters
pub struct ParamDiscovery {
    cache_path: PathBuf,
}

impl ParamDiscovery {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        ParamDiscovery {
            cache_path: config_dir.as_ref().join(CACHE_FILE),
        }
    }

    /// Default location under the per-user config directory
    pub fn with_default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grubsmith");
        Self::new(dir)
    }

    /// Run `info grub` and extract parameter tokens from the "Simple
    /// configuration" section.
    pub fn discover(&self) -> (BTreeSet<String>, DiscoveryState) {
        let output = Command::new("info")
            .args(["-f", "grub", "-n", "Simple configuration", "--output=-"])
            .output();

        let output = match output {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "info command unavailable");
                return (BTreeSet::new(), DiscoveryState::NoDocs);
            }
        };

        if !output.status.success() {
            warn!(status = ?output.status.code(), "info command failed; GRUB docs may not be installed");
            return (BTreeSet::new(), DiscoveryState::NoDocs);
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let params = extract_params(&text);

        if params.is_empty() {
            warn!("no parameters parsed from info output");
            (params, DiscoveryState::CannotParse)
        } else {
            debug!(count = params.len(), "discovered parameters");
            (params, DiscoveryState::Ok)
        }
    }

    pub fn load_cache(&self) -> CatalogResult<Option<DiscoveryCache>> {
        if !self.cache_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.cache_path)
            .map_err(|e| CatalogError::io(&self.cache_path, e))?;
        let cache = serde_json::from_str(&content).map_err(|e| CatalogError::CacheParse {
            path: self.cache_path.clone(),
            source: e,
        })?;
        Ok(Some(cache))
    }

    pub fn save_cache(&self, cache: &DiscoveryCache) -> CatalogResult<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(cache)?;
        std::fs::write(&self.cache_path, content)
            .map_err(|e| CatalogError::io(&self.cache_path, e))?;
        Ok(())
    }

    /// Whether a fresh discovery run is warranted. `NoDocs` always retries
    /// (the docs may have been installed since); otherwise only when the
    /// cache is older than a week.
    fn should_regenerate(cache: &DiscoveryCache) -> bool {
        match cache.state {
            DiscoveryState::NoDocs => true,
            DiscoveryState::Ok | DiscoveryState::CannotParse => {
                now_unix().saturating_sub(cache.unixtime) > WEEK_SECS
            }
        }
    }

    /// System-supported parameters, served from cache when it is still
    /// fresh. A failed rediscovery never replaces a previous `Ok` result.
    pub fn system_params(&self, force: bool) -> CatalogResult<BTreeSet<String>> {
        let cached = self.load_cache().unwrap_or_else(|e| {
            warn!(error = %e, "discovery cache unreadable; rediscovering");
            None
        });

        if !force {
            if let Some(cache) = &cached {
                if !Self::should_regenerate(cache) {
                    return Ok(cache.params.clone());
                }
            }
        }

        let (params, state) = self.discover();

        if let Some(cache) = &cached {
            if cache.state == DiscoveryState::Ok && state != DiscoveryState::Ok {
                // Keep the good result, just bump the timestamp so the
                // failed attempt is not retried immediately.
                let refreshed = DiscoveryCache {
                    params: cache.params.clone(),
                    state: DiscoveryState::Ok,
                    unixtime: now_unix(),
                };
                self.save_cache(&refreshed)?;
                return Ok(refreshed.params);
            }
        }

        let cache = DiscoveryCache {
            params: params.clone(),
            state,
            unixtime: now_unix(),
        };
        self.save_cache(&cache)?;
        Ok(params)
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn extract_params(text: &str) -> BTreeSet<String> {
    PARAM_TOKEN
        .captures_iter(text)
        .map(|c| c[1].to_string())
        // Length sanity plus a double-underscore filter keeps out false
        // positives from surrounding prose.
        .filter(|p| (10..=40).contains(&p.len()) && !p.contains("__"))
        .collect()
}
