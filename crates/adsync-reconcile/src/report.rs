//! Report model: every publisher's result plus the master's own change
//! summary. The sole output surface of the core; renderers live elsewhere.

use std::collections::BTreeMap;

use adsync_records::{MasterChange, MasterList};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PublisherStatus, ReconciliationResult};

/// Status counts across the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub ok: usize,
    pub missing_records: usize,
    pub unreachable: usize,
    pub parse_error: usize,
}

impl ReportSummary {
    fn count(&mut self, status: PublisherStatus) {
        self.total += 1;
        match status {
            PublisherStatus::Ok => self.ok += 1,
            PublisherStatus::MissingRecords => self.missing_records += 1,
            PublisherStatus::Unreachable => self.unreachable += 1,
            PublisherStatus::ParseError => self.parse_error += 1,
        }
    }

    /// Publishers not in OK state.
    pub fn drift(&self) -> usize {
        self.total - self.ok
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub master_record_count: usize,
    /// What canonicalizing the master changed.
    pub master: MasterChange,
    pub summary: ReportSummary,
    /// Keyed by publisher domain; iteration order is deterministic.
    pub publishers: BTreeMap<String, ReconciliationResult>,
}

impl Report {
    /// Empty report for `master`. The caller supplies the timestamp; the
    /// core never reads the clock.
    pub fn new(master: &MasterList, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            master_record_count: master.len(),
            master: MasterChange::from_canonicalize(master.changes()),
            summary: ReportSummary::default(),
            publishers: BTreeMap::new(),
        }
    }

    /// Add or replace the result for `domain`. Returns the replaced result.
    pub fn insert(
        &mut self,
        domain: impl Into<String>,
        result: ReconciliationResult,
    ) -> Option<ReconciliationResult> {
        let previous = self.publishers.insert(domain.into(), result);
        self.summary = self.compute_summary();
        previous
    }

    pub fn get(&self, domain: &str) -> Option<&ReconciliationResult> {
        self.publishers.get(domain)
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    /// `true` when every publisher is OK.
    pub fn is_clean(&self) -> bool {
        self.publishers.values().all(ReconciliationResult::is_ok)
    }

    /// Publishers with the given status, in domain order.
    pub fn with_status(
        &self,
        status: PublisherStatus,
    ) -> impl Iterator<Item = (&String, &ReconciliationResult)> + '_ {
        self.publishers
            .iter()
            .filter(move |(_, r)| r.status == status)
    }

    fn compute_summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for result in self.publishers.values() {
            summary.count(result.status);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reconcile_failure, reconcile_text, FetchFailure};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn insert_replaces_and_recounts() {
        let m = MasterList::from_text("a.com, 1, DIRECT\n").unwrap();
        let mut report = Report::new(&m, fixed_time());
        assert!(report.insert("pub.example", reconcile_text(&m, "")).is_none());
        assert_eq!(report.summary.missing_records, 1);

        let replaced = report.insert("pub.example", reconcile_text(&m, "a.com, 1, DIRECT\n"));
        assert!(replaced.is_some());
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.summary,
            ReportSummary {
                total: 1,
                ok: 1,
                ..ReportSummary::default()
            }
        );
        assert!(report.is_clean());
    }

    #[test]
    fn master_change_is_carried() {
        let m = MasterList::from_text("a.com, 1, DIRECT\na.com, 1, DIRECT, c\n").unwrap();
        let report = Report::new(&m, fixed_time());
        assert_eq!(report.master_record_count, 1);
        assert_eq!(report.master.deduped_away.len(), 1);
    }

    #[test]
    fn json_shape_is_stable() {
        let m = MasterList::from_text("a.com, 1, DIRECT\n").unwrap();
        let mut report = Report::new(&m, fixed_time());
        report.insert(
            "down.example",
            reconcile_failure(FetchFailure::NotFound {
                status: 404,
                message: "HTTP 404".to_string(),
            }),
        );
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["generated_at"], "2026-01-02T03:04:05Z");
        let p = &v["publishers"]["down.example"];
        assert_eq!(p["status"], "UNREACHABLE");
        assert_eq!(p["failure_reason"]["kind"], "not_found");
        assert_eq!(p["failure_reason"]["status"], 404);
        assert_eq!(v["summary"]["unreachable"], 1);

        let back: Report = serde_json::from_value(v).unwrap();
        assert_eq!(back, report);
    }
}
