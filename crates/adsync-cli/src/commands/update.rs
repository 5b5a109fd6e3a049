//! `adsync update`: absorb partner files into the master.

use std::path::PathBuf;
use std::process::ExitCode;

use adsync_artifacts::{
    init_run_artifacts, write_update_artifacts, InitRunArtifactsArgs, UpdateReport,
};
use adsync_config::ConfigMode;
use adsync_runtime::{plan_update, write_master};
use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{load_config, resolve_master_path, resolve_out_dir};

pub struct UpdateArgs {
    pub config_paths: Vec<PathBuf>,
    pub master: Option<PathBuf>,
    pub partners_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn update(args: UpdateArgs) -> Result<ExitCode> {
    let (loaded, cfg) = load_config(&args.config_paths, ConfigMode::Update, false)?;
    let master_path = resolve_master_path(args.master, &cfg)?;
    let partners_dir = args.partners_dir.or_else(|| cfg.update.partners_dir.clone());
    if partners_dir.is_none() {
        warn!("no partners dir: only canonicalizing the master");
    }

    let plan = plan_update(&master_path, partners_dir.as_deref())?;
    for line in &plan.change.invalid {
        warn!(
            source = %line.source,
            line_no = line.line_no,
            reason = %line.reason,
            "partner line is not a record; skipped"
        );
    }

    if args.dry_run {
        info!(master = %master_path.display(), "dry run; master left untouched");
    } else {
        write_master(&master_path, &plan.after, cfg.master.header.as_deref())?;
        info!(master = %master_path.display(), records = plan.after.len(), "master written");
    }

    let exports_root = resolve_out_dir(args.out_dir, &cfg);
    let run_id = Uuid::new_v4();
    let art = init_run_artifacts(InitRunArtifactsArgs {
        exports_root: &exports_root,
        run_id,
        command: "update",
        config_hash: &loaded.config_hash,
        master_path: &master_path,
    })?;
    let report = UpdateReport {
        generated_at: Utc::now(),
        dry_run: args.dry_run,
        master_path: master_path.display().to_string(),
        partner_files: plan.partner_files,
        records_before: plan.before.len(),
        records_after: plan.after.len(),
        change: plan.change,
    };
    let (json_path, md_path) = write_update_artifacts(&art.run_dir, &report)?;

    println!("run_id={}", run_id);
    println!("run_dir={}", art.run_dir.display());
    println!("update_report_json={}", json_path.display());
    println!("update_report_md={}", md_path.display());
    println!("records_before={}", report.records_before);
    println!("records_after={}", report.records_after);
    println!("added={}", report.change.added.len());
    println!("deduped_away={}", report.change.deduped_away.len());
    println!("invalid={}", report.change.invalid.len());
    println!("dry_run={}", args.dry_run);
    Ok(ExitCode::SUCCESS)
}
