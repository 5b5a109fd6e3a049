//! adsync-merge
//!
//! Idempotent merge of missing records into an existing app-ads.txt text.
//!
//! - Every existing line is kept verbatim and in place (malformed included)
//! - Only records whose identity key is absent are appended, in patch order
//! - Merging the same patch twice equals merging it once
//!
//! Pure text in, text out. Callers serialize merges per target file.

use std::collections::BTreeSet;

use adsync_records::{OtherLine, Record, RecordKey, RecordList};
use serde::Serialize;

/// Banner written by default above an appended block.
pub const DEFAULT_BANNER: &str = "# --- Added via tool ---";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Comment line written once before the appended records. Only written
    /// when at least one record is appended.
    pub banner: Option<String>,
}

impl MergeOptions {
    pub fn with_banner(banner: impl Into<String>) -> Self {
        Self {
            banner: Some(banner.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub text: String,
    /// Records appended, in patch order.
    pub added: Vec<Record>,
    /// Patch records whose key was already present (or repeated in the patch).
    pub skipped: Vec<Record>,
    /// Patch lines that were not records. Only filled by [`merge_patch_text`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid: Vec<OtherLine>,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

/// Append the records of `patch` missing from `existing`.
pub fn merge(existing: &str, patch: &[Record], opts: &MergeOptions) -> MergeOutcome {
    let mut present: BTreeSet<RecordKey> = RecordList::load(existing).keys();

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for record in patch {
        if present.insert(record.key()) {
            added.push(record.clone());
        } else {
            skipped.push(record.clone());
        }
    }

    if added.is_empty() {
        return MergeOutcome {
            text: existing.to_string(),
            added,
            skipped,
            invalid: Vec::new(),
        };
    }

    let eol = if existing.contains("\r\n") { "\r\n" } else { "\n" };
    let mut text = String::with_capacity(existing.len() + added.len() * 48);
    text.push_str(existing);

    if !text.is_empty() {
        if !text.ends_with('\n') {
            text.push_str(eol);
        }
        if !ends_with_blank_line(&text) {
            text.push_str(eol);
        }
    }

    if let Some(banner) = &opts.banner {
        text.push_str(banner.trim_end());
        text.push_str(eol);
    }
    for record in &added {
        text.push_str(&record.serialize());
        text.push_str(eol);
    }

    MergeOutcome {
        text,
        added,
        skipped,
        invalid: Vec::new(),
    }
}

/// Merge a patch file's text: record lines in file order; comments and
/// blanks are ignored, malformed lines are returned in `invalid`.
pub fn merge_patch_text(existing: &str, patch_text: &str, opts: &MergeOptions) -> MergeOutcome {
    let patch = RecordList::load(patch_text);
    let records: Vec<Record> = patch.records().cloned().collect();
    let mut outcome = merge(existing, &records, opts);
    outcome.invalid = patch.malformed().cloned().collect();
    outcome
}

/// `text` is newline-terminated; true when its final line is blank.
fn ends_with_blank_line(text: &str) -> bool {
    text.lines().last().map_or(true, |l| l.trim().is_empty())
}
