//! List store: an ordered collection of records plus the lines that were not
//! records.
//!
//! `RecordList::load` keeps everything it sees (record lines with their raw
//! text and line number, and every other line verbatim). `canonicalize`
//! produces the unique normal form: one record per identity key, sorted by
//! the total order, no comments.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{parse_line, LineKind, MalformedReason, Record, RecordKey};

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// A record together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLine {
    /// 1-based line number in the loaded text.
    pub line_no: usize,
    /// Verbatim line text (without the line terminator).
    pub raw: String,
    pub record: Record,
}

/// What a non-record line was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OtherKind {
    Blank,
    Comment,
    Variable { key: String, value: String },
    Malformed { reason: MalformedReason },
}

/// A line that did not produce a record, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherLine {
    pub line_no: usize,
    pub text: String,
    #[serde(flatten)]
    pub kind: OtherKind,
}

impl OtherLine {
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, OtherKind::Malformed { .. })
    }

    pub fn malformed_reason(&self) -> Option<&MalformedReason> {
        match &self.kind {
            OtherKind::Malformed { reason } => Some(reason),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RecordList
// ---------------------------------------------------------------------------

/// Ordered records plus the side-list of non-record lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordList {
    records: Vec<RecordLine>,
    others: Vec<OtherLine>,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every line of `text`. Never fails; malformed lines land in
    /// the side-list.
    pub fn load(text: &str) -> Self {
        let mut list = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let kind = match parse_line(raw) {
                LineKind::Record(record) => {
                    list.records.push(RecordLine {
                        line_no,
                        raw: raw.to_string(),
                        record,
                    });
                    continue;
                }
                LineKind::Blank => OtherKind::Blank,
                LineKind::Comment => OtherKind::Comment,
                LineKind::Variable { key, value } => OtherKind::Variable { key, value },
                LineKind::Malformed(reason) => OtherKind::Malformed { reason },
            };
            list.others.push(OtherLine {
                line_no,
                text: raw.to_string(),
                kind,
            });
        }
        list
    }

    /// Build a list from records alone, numbering them in order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| RecordLine {
                line_no: idx + 1,
                raw: record.serialize(),
                record,
            })
            .collect();
        Self {
            records,
            others: Vec::new(),
        }
    }

    /// Append another list's lines after this one's. Used to pool master and
    /// partner inputs before canonicalizing.
    pub fn extend(&mut self, other: RecordList) {
        self.records.extend(other.records);
        self.others.extend(other.others);
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().map(|l| &l.record)
    }

    pub fn record_lines(&self) -> &[RecordLine] {
        &self.records
    }

    /// Non-record lines in input order.
    pub fn other_lines(&self) -> &[OtherLine] {
        &self.others
    }

    pub fn malformed(&self) -> impl Iterator<Item = &OtherLine> + '_ {
        self.others.iter().filter(|l| l.is_malformed())
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> BTreeSet<RecordKey> {
        self.records().map(Record::key).collect()
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.records().any(|r| {
            r.ad_system_domain() == key.ad_system_domain
                && r.publisher_account_id() == key.publisher_account_id
                && r.relationship() == key.relationship
        })
    }

    /// Canonical form of this list. See [`RecordList::canonicalize_with_changes`].
    pub fn canonicalize(&self) -> RecordList {
        self.canonicalize_with_changes().0
    }

    /// Dedup by identity key, drop non-record lines, sort by the total order.
    ///
    /// Preference between two records sharing a key, independent of input
    /// order:
    /// 1. a non-empty certification id beats none;
    /// 2. otherwise the smaller certification id (`None` < `Some("")` < ...);
    /// 3. identical records keep the first occurrence.
    ///
    /// Two different non-empty certification ids for the same key are
    /// reported as a [`CertConflict`].
    pub fn canonicalize_with_changes(&self) -> (RecordList, CanonicalizeReport) {
        let mut report = CanonicalizeReport::default();
        let mut winners: BTreeMap<RecordKey, &RecordLine> = BTreeMap::new();

        for line in &self.records {
            let canonical = line.record.serialize();
            if line.raw.trim() != canonical {
                report.reformatted.push(Reformatted {
                    line_no: line.line_no,
                    raw: line.raw.clone(),
                    canonical,
                });
            }

            match winners.entry(line.record.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(line);
                }
                Entry::Occupied(mut slot) => {
                    let incumbent = *slot.get();
                    if incumbent.record.has_certification()
                        && line.record.has_certification()
                        && incumbent.record != line.record
                    {
                        report.cert_conflicts.push(CertConflict::between(
                            &incumbent.record,
                            &line.record,
                        ));
                    }
                    if outranks(&line.record, &incumbent.record) {
                        report.deduped_away.push(incumbent.clone());
                        slot.insert(line);
                    } else {
                        report.deduped_away.push(line.clone());
                    }
                }
            }
        }

        report.malformed = self.malformed().cloned().collect();
        report.dropped_lines = self.others.len();
        report.deduped_away.sort_by(|a, b| {
            (&a.record, a.line_no).cmp(&(&b.record, b.line_no))
        });
        report.cert_conflicts.sort();

        let list = RecordList::from_records(winners.into_values().map(|l| l.record.clone()));
        (list, report)
    }

    /// One canonical line per record, each newline-terminated. Non-record
    /// lines are not written.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for r in self.records() {
            out.push_str(&r.serialize());
            out.push('\n');
        }
        out
    }
}

/// `true` when `candidate` should replace `incumbent` for the same key.
fn outranks(candidate: &Record, incumbent: &Record) -> bool {
    match (candidate.has_certification(), incumbent.has_certification()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.certification_authority_id() < incumbent.certification_authority_id(),
    }
}

// ---------------------------------------------------------------------------
// Canonicalization report
// ---------------------------------------------------------------------------

/// A record line whose raw text differed from its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reformatted {
    pub line_no: usize,
    pub raw: String,
    pub canonical: String,
}

/// Same identity key, two different non-empty certification ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertConflict {
    pub key: RecordKey,
    /// Certification id that survived canonicalization.
    pub kept: String,
    pub dropped: String,
}

impl CertConflict {
    fn between(a: &Record, b: &Record) -> Self {
        let ca = a.certification_authority_id().unwrap_or_default().to_string();
        let cb = b.certification_authority_id().unwrap_or_default().to_string();
        let (kept, dropped) = if ca <= cb { (ca, cb) } else { (cb, ca) };
        Self {
            key: a.key(),
            kept,
            dropped,
        }
    }
}

impl fmt::Display for CertConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} certification '{}' kept over '{}'",
            self.key, self.kept, self.dropped
        )
    }
}

/// What `canonicalize_with_changes` did to its input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalizeReport {
    /// Record lines removed because another line with the same key won.
    pub deduped_away: Vec<RecordLine>,
    pub reformatted: Vec<Reformatted>,
    pub cert_conflicts: Vec<CertConflict>,
    pub malformed: Vec<OtherLine>,
    /// Count of non-record lines (comments, blanks, variables, malformed) dropped.
    pub dropped_lines: usize,
}

impl CanonicalizeReport {
    /// `true` when the input was already in canonical form.
    pub fn is_noop(&self) -> bool {
        self.deduped_away.is_empty()
            && self.reformatted.is_empty()
            && self.cert_conflicts.is_empty()
            && self.dropped_lines == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
