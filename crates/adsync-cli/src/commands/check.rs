//! `adsync check`: fetch, reconcile, write the run directory.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use adsync_artifacts::{init_run_artifacts, write_check_artifacts, InitRunArtifactsArgs};
use adsync_config::{load_roster, ConfigMode};
use adsync_fetch::{Fetcher, HttpFetcher};
use adsync_reconcile::{check_compliance, ComplianceGate};
use adsync_runtime::{load_master, CheckRun};
use anyhow::Result;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::{load_config, resolve_master_path, resolve_out_dir, EXIT_DRIFT};

pub struct CheckArgs {
    pub config_paths: Vec<PathBuf>,
    pub master: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub fail_on_drift: bool,
    pub strict_config: bool,
}

pub async fn check(args: CheckArgs) -> Result<ExitCode> {
    let (loaded, cfg) = load_config(&args.config_paths, ConfigMode::Check, args.strict_config)?;
    let master_path = resolve_master_path(args.master, &cfg)?;
    let master = Arc::new(load_master(&master_path)?);

    let roster = load_roster(&cfg)?;
    for domain in &roster.duplicates {
        warn!(publisher = %domain, "duplicate roster entry ignored");
    }
    if roster.is_empty() {
        warn!("no publishers configured; the report will be empty");
    }

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(cfg.fetch.to_settings())?);
    let run = CheckRun::new(master, fetcher, cfg.fetch.concurrency);
    let report = run.run(&roster.publishers, Utc::now()).await;

    let exports_root = resolve_out_dir(args.out_dir, &cfg);
    let run_id = Uuid::new_v4();
    let art = init_run_artifacts(InitRunArtifactsArgs {
        exports_root: &exports_root,
        run_id,
        command: "check",
        config_hash: &loaded.config_hash,
        master_path: &master_path,
    })?;
    let written = write_check_artifacts(&art.run_dir, &report, &roster.publishers)?;

    let s = &report.summary;
    println!("run_id={}", run_id);
    println!("run_dir={}", art.run_dir.display());
    println!("report_json={}", written.report_json.display());
    println!("report_md={}", written.report_md.display());
    println!("patches={}", written.patches.len());
    println!(
        "total={} ok={} missing_records={} unreachable={} parse_error={}",
        s.total, s.ok, s.missing_records, s.unreachable, s.parse_error
    );

    match check_compliance(&report) {
        ComplianceGate::Compliant => {
            println!("compliance=OK");
            Ok(ExitCode::SUCCESS)
        }
        ComplianceGate::Drift { summary, offenders } => {
            println!("compliance=DRIFT drift={}", summary.drift());
            for o in &offenders {
                println!(
                    "  {} status={} missing={} conflicts={}",
                    o.domain, o.status, o.missing, o.conflicts
                );
            }
            if args.fail_on_drift {
                Ok(ExitCode::from(EXIT_DRIFT))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
