//! adsync-artifacts
//!
//! Run directories and the files written into them.
//!
//! exports/<run_id>/
//!   manifest.json
//!   report.json, report.md              (check)
//!   patches/<domain>_missing.txt        (check)
//!   update_report.json, update_report.md (update)

mod markdown;
mod patches;

pub use markdown::{render_report_markdown, render_update_markdown};
pub use patches::{patch_file_name, render_patch};

use adsync_reconcile::{Publisher, Report};
use adsync_records::MasterChange;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const MANIFEST_SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    /// `check` or `update`.
    pub command: String,
    pub config_hash: String,
    pub master_path: String,
    pub created_at_utc: DateTime<Utc>,
    /// File names relative to the run directory.
    pub artifacts: Vec<String>,
}

pub struct InitRunArtifactsArgs<'a> {
    pub exports_root: &'a Path,
    pub run_id: Uuid,
    pub command: &'a str,
    pub config_hash: &'a str,
    pub master_path: &'a Path,
}

pub struct InitRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Create `<exports_root>/<run_id>/` and write its manifest.
pub fn init_run_artifacts(args: InitRunArtifactsArgs<'_>) -> Result<InitRunArtifactsResult> {
    let run_dir = args.exports_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        run_id: args.run_id,
        command: args.command.to_string(),
        config_hash: args.config_hash.to_string(),
        master_path: args.master_path.display().to_string(),
        created_at_utc: Utc::now(),
        artifacts: vec!["manifest.json".to_string()],
    };
    let manifest_path = run_dir.join("manifest.json");
    write_json(&manifest_path, &manifest)?;

    Ok(InitRunArtifactsResult {
        run_dir,
        manifest_path,
    })
}

/// Append file names to the manifest's artifact list.
fn record_artifacts(run_dir: &Path, names: &[String]) -> Result<()> {
    let manifest_path = run_dir.join("manifest.json");
    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("read manifest failed: {}", manifest_path.display()))?;
    let mut manifest: RunManifest = serde_json::from_str(&raw)
        .with_context(|| format!("parse manifest failed: {}", manifest_path.display()))?;
    for name in names {
        if !manifest.artifacts.contains(name) {
            manifest.artifacts.push(name.clone());
        }
    }
    write_json(&manifest_path, &manifest)
}

pub struct CheckArtifacts {
    pub report_json: PathBuf,
    pub report_md: PathBuf,
    pub patches: Vec<PathBuf>,
}

/// Write report.json, report.md and one patch file per reconciled
/// publisher.
pub fn write_check_artifacts(
    run_dir: &Path,
    report: &Report,
    roster: &[Publisher],
) -> Result<CheckArtifacts> {
    let report_json = run_dir.join("report.json");
    write_json(&report_json, report)?;

    let report_md = run_dir.join("report.md");
    write_text(&report_md, &render_report_markdown(report, roster))?;

    let patch_dir = run_dir.join("patches");
    fs::create_dir_all(&patch_dir)
        .with_context(|| format!("create patch dir failed: {}", patch_dir.display()))?;

    let mut names = vec!["report.json".to_string(), "report.md".to_string()];
    let mut patches = Vec::new();
    for (domain, result) in &report.publishers {
        if let Some(text) = render_patch(domain, result) {
            let file_name = patch_file_name(domain);
            let path = patch_dir.join(&file_name);
            write_text(&path, &text)?;
            names.push(format!("patches/{file_name}"));
            patches.push(path);
        }
    }
    record_artifacts(run_dir, &names)?;

    info!(
        run_dir = %run_dir.display(),
        publishers = report.len(),
        patches = patches.len(),
        "check artifacts written"
    );
    Ok(CheckArtifacts {
        report_json,
        report_md,
        patches,
    })
}

/// Outcome of a master update, as written to update_report.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub master_path: String,
    pub partner_files: Vec<String>,
    pub records_before: usize,
    pub records_after: usize,
    pub change: MasterChange,
}

pub fn write_update_artifacts(run_dir: &Path, report: &UpdateReport) -> Result<(PathBuf, PathBuf)> {
    let json_path = run_dir.join("update_report.json");
    write_json(&json_path, report)?;
    let md_path = run_dir.join("update_report.md");
    write_text(&md_path, &render_update_markdown(report))?;
    record_artifacts(
        run_dir,
        &[
            "update_report.json".to_string(),
            "update_report.md".to_string(),
        ],
    )?;
    Ok((json_path, md_path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize failed: {}", path.display()))?;
    write_text(path, &format!("{json}\n"))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("write failed: {}", path.display()))
}
