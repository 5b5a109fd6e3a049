//! Master file IO and the master update flow.

use std::fs;
use std::path::{Path, PathBuf};

use adsync_records::{absorb, MasterChange, MasterList, PartnerList};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Read and canonicalize the master file. A master with no usable records
/// is fatal.
pub fn load_master(path: &Path) -> Result<MasterList> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read master: {}", path.display()))?;
    let master = MasterList::from_text(&text)
        .with_context(|| format!("unusable master: {}", path.display()))?;

    let changes = master.changes();
    if !changes.malformed.is_empty() {
        warn!(
            master = %path.display(),
            malformed = changes.malformed.len(),
            "master has malformed lines; they are ignored"
        );
    }
    if !changes.cert_conflicts.is_empty() {
        warn!(
            master = %path.display(),
            conflicts = changes.cert_conflicts.len(),
            "master lists one key with different certification ids"
        );
    }
    Ok(master)
}

/// Write the master in its framed canonical form.
pub fn write_master(path: &Path, master: &MasterList, header: Option<&str>) -> Result<()> {
    fs::write(path, master.to_text(header))
        .with_context(|| format!("failed to write master: {}", path.display()))
}

/// `*.txt` files directly under `dir`, sorted by file name.
pub fn partner_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to list partner dir: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

pub fn read_partner_lists(dir: &Path) -> Result<Vec<PartnerList>> {
    partner_files(dir)?
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read partner file: {}", path.display()))?;
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(PartnerList::load(source, &text))
        })
        .collect()
}

pub struct UpdateOutcome {
    pub before: MasterList,
    pub after: MasterList,
    pub change: MasterChange,
    pub partner_files: Vec<String>,
}

/// Absorb every partner file under `partners_dir` (if any) into the master
/// at `master_path`. Nothing is written; see [`write_master`].
pub fn plan_update(master_path: &Path, partners_dir: Option<&Path>) -> Result<UpdateOutcome> {
    let before = load_master(master_path)?;
    let partners = match partners_dir {
        Some(dir) => read_partner_lists(dir)?,
        None => Vec::new(),
    };

    let (after, mut change) = absorb(&before, &partners);
    // The master's own cleanup belongs to the change too.
    let own = MasterChange::from_canonicalize(before.changes());
    change.deduped_away.splice(0..0, own.deduped_away);
    change.reformatted = own.reformatted;
    change.cert_conflicts.splice(0..0, own.cert_conflicts);
    change.deduped_away.sort();
    change.cert_conflicts.sort();
    change.cert_conflicts.dedup();

    info!(
        master = %master_path.display(),
        partners = partners.len(),
        before = before.len(),
        after = after.len(),
        added = change.added.len(),
        "master update planned"
    );

    Ok(UpdateOutcome {
        partner_files: partners.into_iter().map(|p| p.source).collect(),
        before,
        after,
        change,
    })
}
