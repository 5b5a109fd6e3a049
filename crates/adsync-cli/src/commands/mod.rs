//! Command handler modules for adsync-cli.
//!
//! Shared config plumbing lives here; command-specific logic lives in the
//! submodules. Handlers return the process exit code; fatal errors bubble
//! up as `anyhow::Error` and exit with [`EXIT_FATAL`].

pub mod check;
pub mod files;
pub mod sellers;
pub mod update;

use std::path::PathBuf;

use adsync_config::{
    report_unused_keys, AdsyncConfig, ConfigMode, LoadedConfig, UnusedKeyPolicy,
};
use anyhow::{Context, Result};
use tracing::warn;

/// `check` finished with drift under `--fail-on-drift`, or sellers.json has errors.
pub const EXIT_DRIFT: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

/// Unused keys listed before the rest is summarized.
const UNUSED_KEYS_SHOWN: usize = 50;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config for `mode`, run the unused-key guard and return the
/// typed view. No paths means an empty config.
pub fn load_config(
    paths: &[PathBuf],
    mode: ConfigMode,
    strict: bool,
) -> Result<(LoadedConfig, AdsyncConfig)> {
    let loaded = adsync_config::load_layered_yaml(paths)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(mode, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            mode = mode.as_str(),
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(UNUSED_KEYS_SHOWN) {
            warn!(unused = %p, "unused config key");
        }
        let extra = report
            .unused_leaf_pointers
            .len()
            .saturating_sub(UNUSED_KEYS_SHOWN);
        if extra > 0 {
            warn!(extra, "more unused config keys not shown");
        }
    }

    let cfg = loaded.typed()?;
    Ok((loaded, cfg))
}

/// `--master` wins over `master.path`.
pub fn resolve_master_path(flag: Option<PathBuf>, cfg: &AdsyncConfig) -> Result<PathBuf> {
    flag.or_else(|| cfg.master.path.clone())
        .context("no master file: pass --master or set master.path")
}

/// `--out-dir` wins over `report.out_dir`.
pub fn resolve_out_dir(flag: Option<PathBuf>, cfg: &AdsyncConfig) -> PathBuf {
    flag.unwrap_or_else(|| cfg.report.out_dir.clone())
}
