//! adsync-reconcile
//!
//! Publisher reconciliation against the canonical master list.
//!
//! - Unreachable publisher => UNREACHABLE, failure reason kept
//! - Nothing parseable => PARSE_ERROR
//! - Missing master record or relationship conflict => MISSING_RECORDS
//! - Extra publisher records are informational only
//!
//! Deterministic, pure logic. No IO. No network calls.

mod engine;
mod gate;
mod report;
mod types;

pub use engine::{reconcile, reconcile_failure, reconcile_outcome, reconcile_text};
pub use gate::{check_compliance, ComplianceGate, Offender};
pub use report::{Report, ReportSummary};
pub use types::*;
