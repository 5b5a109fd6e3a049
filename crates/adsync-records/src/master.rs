//! The canonical master list.
//!
//! A `MasterList` is immutable once built: it is the canonicalized form of
//! the master file plus the report of what canonicalization changed. It is
//! shared read-only across every publisher reconciliation.

use std::collections::BTreeSet;
use std::fmt;

use crate::list::{CanonicalizeReport, RecordList};
use crate::record::{Record, RecordKey};

pub const BEGIN_MARKER: &str = "# ----- BEGIN AUTHORIZED LINES -----";
pub const END_MARKER: &str = "# ----- END AUTHORIZED LINES -----";

/// The master text cannot serve as a baseline. Fatal for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// No record lines at all (empty file, or comments only).
    NoRecords { lines: usize },
    /// Lines were present but every candidate record line was malformed.
    AllMalformed { malformed: usize },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::NoRecords { lines } => {
                write!(f, "master list has no records ({lines} line(s) read)")
            }
            StructuralError::AllMalformed { malformed } => write!(
                f,
                "master list unusable: all {malformed} candidate record line(s) are malformed"
            ),
        }
    }
}

impl std::error::Error for StructuralError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterList {
    list: RecordList,
    keys: BTreeSet<RecordKey>,
    changes: CanonicalizeReport,
}

impl MasterList {
    /// Load and canonicalize master text.
    pub fn from_text(text: &str) -> Result<Self, StructuralError> {
        Self::from_list(&RecordList::load(text))
    }

    pub fn from_list(raw: &RecordList) -> Result<Self, StructuralError> {
        if raw.is_empty() {
            let malformed = raw.malformed_count();
            return Err(if malformed > 0 {
                StructuralError::AllMalformed { malformed }
            } else {
                StructuralError::NoRecords {
                    lines: raw.other_lines().len(),
                }
            });
        }
        let (list, changes) = raw.canonicalize_with_changes();
        Ok(Self::from_canonical(list, changes))
    }

    /// Wrap an already-canonical list.
    pub(crate) fn from_canonical(list: RecordList, changes: CanonicalizeReport) -> Self {
        let keys = list.keys();
        Self {
            list,
            keys,
            changes,
        }
    }

    /// Records in canonical order.
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.list.records()
    }

    pub fn list(&self) -> &RecordList {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn keys(&self) -> &BTreeSet<RecordKey> {
        &self.keys
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.keys.contains(key)
    }

    /// What canonicalizing the source text changed.
    pub fn changes(&self) -> &CanonicalizeReport {
        &self.changes
    }

    /// Master file text: optional comment header, then the canonical body
    /// between BEGIN/END markers. Loading this text back yields the same
    /// master.
    pub fn to_text(&self, header: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(header) = header {
            for line in header.lines() {
                let line = line.trim_end();
                if line.starts_with('#') {
                    out.push_str(line);
                } else if line.is_empty() {
                    out.push('#');
                } else {
                    out.push_str("# ");
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        out.push_str(BEGIN_MARKER);
        out.push('\n');
        out.push_str(&self.list.serialize());
        out.push_str(END_MARKER);
        out.push('\n');
        out
    }
}
