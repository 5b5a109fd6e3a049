//! Master update: absorb partner-supplied lists into the master.
//!
//! Partner lists are pooled after the master, canonicalized together, and the
//! difference against the original master is summarized as a
//! [`MasterChange`]. Callers pass partners in a deterministic order (sorted
//! by source name); the canonical result does not depend on it, but the
//! `already_present` and `invalid` listings follow it.

use serde::{Deserialize, Serialize};

use crate::list::{CanonicalizeReport, CertConflict, RecordList, Reformatted};
use crate::master::MasterList;
use crate::record::{MalformedReason, Record};

/// A partner input: a source label (usually the file name) and its lines.
#[derive(Debug, Clone)]
pub struct PartnerList {
    pub source: String,
    pub list: RecordList,
}

impl PartnerList {
    pub fn load(source: impl Into<String>, text: &str) -> Self {
        Self {
            source: source.into(),
            list: RecordList::load(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedRecord {
    pub source: String,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedLine {
    pub source: String,
    pub line_no: usize,
    pub text: String,
    pub reason: MalformedReason,
}

/// Summary of how the master changed.
///
/// For a plain canonicalize step only `deduped_away`, `reformatted` and
/// `cert_conflicts` can be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterChange {
    /// Records whose identity key was not in the master before.
    pub added: Vec<Record>,
    /// Records removed because another record with the same key won.
    pub deduped_away: Vec<Record>,
    #[serde(default)]
    pub reformatted: Vec<Reformatted>,
    #[serde(default)]
    pub cert_conflicts: Vec<CertConflict>,
    /// Partner records already in the master.
    #[serde(default)]
    pub already_present: Vec<SourcedRecord>,
    /// Malformed partner lines.
    #[serde(default)]
    pub invalid: Vec<SourcedLine>,
}

impl MasterChange {
    /// Summary of the master's own canonicalization.
    pub fn from_canonicalize(report: &CanonicalizeReport) -> Self {
        Self {
            deduped_away: report.deduped_away.iter().map(|l| l.record.clone()).collect(),
            reformatted: report.reformatted.clone(),
            cert_conflicts: report.cert_conflicts.clone(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deduped_away.is_empty()
            && self.reformatted.is_empty()
            && self.cert_conflicts.is_empty()
    }
}

/// Pool `partners` into `master` and canonicalize the result.
///
/// The master's own non-record lines are dropped as in any canonicalize;
/// partner comments are ignored. Returns the updated master and the change
/// summary.
pub fn absorb(master: &MasterList, partners: &[PartnerList]) -> (MasterList, MasterChange) {
    let mut change = MasterChange::default();
    let mut pooled = master.list().clone();

    for partner in partners {
        for line in partner.list.record_lines() {
            if master.contains_key(&line.record.key()) {
                change.already_present.push(SourcedRecord {
                    source: partner.source.clone(),
                    record: line.record.clone(),
                });
            }
        }
        for line in partner.list.malformed() {
            if let Some(reason) = line.malformed_reason() {
                change.invalid.push(SourcedLine {
                    source: partner.source.clone(),
                    line_no: line.line_no,
                    text: line.text.clone(),
                    reason: reason.clone(),
                });
            }
        }
        pooled.extend(RecordList::from_records(partner.list.records().cloned()));
    }

    let (merged, report) = pooled.canonicalize_with_changes();
    change.added = merged
        .records()
        .filter(|r| !master.contains_key(&r.key()))
        .cloned()
        .collect();
    change.deduped_away = report
        .deduped_away
        .iter()
        .map(|l| l.record.clone())
        .collect();
    change.cert_conflicts = report.cert_conflicts.clone();

    (MasterList::from_canonical(merged, report), change)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(text: &str) -> MasterList {
        MasterList::from_text(text).unwrap()
    }

    #[test]
    fn absorb_adds_new_records_sorted() {
        let m = master("b.com, 1, DIRECT\n");
        let partners = vec![
            PartnerList::load("p1.txt", "a.com, 9, RESELLER\nb.com, 1, DIRECT\n"),
            PartnerList::load("p2.txt", "c.com, 3, DIRECT, cert\nnot a record\n"),
        ];
        let (updated, change) = absorb(&m, &partners);
        assert_eq!(
            updated.list().serialize(),
            "a.com, 9, RESELLER\nb.com, 1, DIRECT\nc.com, 3, DIRECT, cert\n"
        );
        assert_eq!(change.added.len(), 2);
        assert_eq!(change.already_present.len(), 1);
        assert_eq!(change.already_present[0].source, "p1.txt");
        assert_eq!(change.invalid.len(), 1);
        assert_eq!(change.invalid[0].line_no, 2);
        assert_eq!(change.deduped_away.len(), 1);
    }

    #[test]
    fn absorb_upgrades_certless_master_record() {
        let m = master("x.com, 1, DIRECT\n");
        let partners = vec![PartnerList::load("p.txt", "x.com, 1, DIRECT, cert1\n")];
        let (updated, change) = absorb(&m, &partners);
        assert_eq!(updated.list().serialize(), "x.com, 1, DIRECT, cert1\n");
        assert!(change.added.is_empty());
        assert_eq!(change.deduped_away.len(), 1);
        assert_eq!(change.deduped_away[0].certification_authority_id(), None);
    }

    #[test]
    fn absorb_reports_cert_conflicts() {
        let m = master("x.com, 1, DIRECT, aaa\n");
        let partners = vec![PartnerList::load("p.txt", "x.com, 1, DIRECT, bbb\n")];
        let (updated, change) = absorb(&m, &partners);
        assert_eq!(updated.list().serialize(), "x.com, 1, DIRECT, aaa\n");
        assert_eq!(change.cert_conflicts.len(), 1);
        assert_eq!(change.cert_conflicts[0].dropped, "bbb");
    }

    #[test]
    fn absorb_with_no_partners_is_identity() {
        let m = master("a.com, 1, DIRECT\n");
        let (updated, change) = absorb(&m, &[]);
        assert_eq!(updated.list(), m.list());
        assert!(change.is_empty());
    }
}
