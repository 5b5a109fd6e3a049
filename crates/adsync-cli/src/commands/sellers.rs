//! `adsync sellers-check`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adsync_config::ConfigMode;
use adsync_runtime::load_master;
use adsync_sellers::{check_sellers, parse_sellers_json, validate_sellers};
use anyhow::{Context, Result};

use super::{load_config, resolve_master_path, EXIT_DRIFT};

/// Missing file and invalid JSON are fatal; structural errors exit with
/// [`EXIT_DRIFT`]; warnings alone succeed.
pub fn sellers_check(
    file: &Path,
    system_domain: Option<&str>,
    config_paths: &[PathBuf],
    master: Option<PathBuf>,
) -> Result<ExitCode> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read sellers.json: {}", file.display()))?;
    let doc = parse_sellers_json(&text).with_context(|| file.display().to_string())?;

    let report = match system_domain {
        Some(domain) => {
            let (_, cfg) = load_config(config_paths, ConfigMode::SellersCheck, false)?;
            let master_path = resolve_master_path(master, &cfg)?;
            let master = load_master(&master_path)?;
            check_sellers(&doc, &master, domain)
        }
        None => validate_sellers(&doc),
    };

    for finding in &report.findings {
        println!("{finding}");
    }
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    println!("sellers={}", report.seller_count);
    println!("errors={errors} warnings={warnings}");

    if report.is_valid() {
        println!("sellers_json=OK");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("sellers_json=INVALID");
        Ok(ExitCode::from(EXIT_DRIFT))
    }
}
