//! Compliance gate.
//!
//! A finished [`Report`] is either compliant (every publisher OK) or in
//! drift. Callers that turn drift into a failing exit status or a blocked
//! deploy step go through [`check_compliance`].
//!
//! Pure and deterministic: no IO, no clock.

use crate::{PublisherStatus, Report, ReportSummary};

/// One publisher that is not OK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offender {
    pub domain: String,
    pub status: PublisherStatus,
    pub missing: usize,
    pub conflicts: usize,
}

/// Result of a compliance check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComplianceGate {
    /// Every publisher is OK.
    Compliant,
    /// At least one publisher is not OK. `offenders` is in domain order.
    Drift {
        summary: ReportSummary,
        offenders: Vec<Offender>,
    },
}

impl ComplianceGate {
    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceGate::Compliant)
    }

    pub fn is_drift(&self) -> bool {
        !self.is_compliant()
    }
}

pub fn check_compliance(report: &Report) -> ComplianceGate {
    if report.is_clean() {
        return ComplianceGate::Compliant;
    }
    let offenders = report
        .publishers
        .iter()
        .filter(|(_, r)| !r.is_ok())
        .map(|(domain, r)| Offender {
            domain: domain.clone(),
            status: r.status,
            missing: r.missing.len(),
            conflicts: r.conflicts.len(),
        })
        .collect();
    ComplianceGate::Drift {
        summary: report.summary.clone(),
        offenders,
    }
}
