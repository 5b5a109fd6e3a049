//! Local file commands: `merge` and `canonicalize`. No network, no config.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use adsync_merge::{merge_patch_text, MergeOptions};
use adsync_records::OtherKind;
use adsync_runtime::{load_master, write_master};
use anyhow::{Context, Result};
use tracing::{info, warn};

pub fn merge(
    input: &Path,
    patch: &Path,
    out: Option<&Path>,
    banner: Option<String>,
    dry_run: bool,
) -> Result<ExitCode> {
    let existing = fs::read_to_string(input)
        .with_context(|| format!("failed to read app-ads.txt: {}", input.display()))?;
    let patch_text = fs::read_to_string(patch)
        .with_context(|| format!("failed to read patch file: {}", patch.display()))?;

    let opts = MergeOptions { banner };
    let outcome = merge_patch_text(&existing, &patch_text, &opts);

    for line in &outcome.invalid {
        if let OtherKind::Malformed { reason } = &line.kind {
            warn!(
                patch = %patch.display(),
                line_no = line.line_no,
                %reason,
                "patch line is not a record; skipped"
            );
        }
    }

    let target = out.unwrap_or(input);
    if dry_run {
        print!("{}", outcome.text);
    } else if outcome.is_noop() && target == input {
        info!(file = %input.display(), "nothing to add; file left untouched");
    } else {
        fs::write(target, &outcome.text)
            .with_context(|| format!("failed to write merged file: {}", target.display()))?;
        info!(file = %target.display(), added = outcome.added.len(), "merged");
    }

    // Keep stdout clean for the merged text in dry-run mode.
    if !dry_run {
        println!("added={}", outcome.added.len());
        println!("skipped={}", outcome.skipped.len());
        println!("invalid={}", outcome.invalid.len());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn canonicalize(path: &Path, out: Option<&Path>, header: Option<&str>) -> Result<ExitCode> {
    let master = load_master(path)?;
    let target = out.unwrap_or(path);
    write_master(target, &master, header)?;

    let changes = master.changes();
    println!("records={}", master.len());
    println!("deduped_away={}", changes.deduped_away.len());
    println!("reformatted={}", changes.reformatted.len());
    println!("cert_conflicts={}", changes.cert_conflicts.len());
    println!("dropped_lines={}", changes.dropped_lines);
    println!("out={}", target.display());
    Ok(ExitCode::SUCCESS)
}
