use std::collections::{BTreeMap, BTreeSet};

use adsync_records::{AccountKey, MasterList, Record, RecordKey, RecordList};

use crate::{
    FetchFailure, FetchOutcome, MalformedLine, PublisherStatus, ReconciliationResult,
    RelationshipConflict,
};

/// Deterministic reconciliation of one publisher list against the master:
/// - no records and at least one malformed line => PARSE_ERROR
/// - any master key absent from the publisher => MISSING_RECORDS
/// - any relationship conflict => MISSING_RECORDS
/// - otherwise OK
///
/// Certification ids never affect the status.
pub fn reconcile(master: &MasterList, publisher: &RecordList) -> ReconciliationResult {
    let malformed: Vec<MalformedLine> = publisher
        .malformed()
        .filter_map(MalformedLine::from_other)
        .collect();

    if publisher.is_empty() && !malformed.is_empty() {
        let mut result = ReconciliationResult::empty(PublisherStatus::ParseError);
        result.malformed = malformed;
        return result;
    }

    // Publisher-side duplicates collapse here; output is in the total order.
    let observed = publisher.canonicalize();
    let observed_keys: BTreeSet<RecordKey> = observed.keys();

    // 1) Missing: master records the publisher does not carry.
    let missing: Vec<Record> = master
        .records()
        .filter(|r| !observed_keys.contains(&r.key()))
        .cloned()
        .collect();

    // 2) Extra: publisher records master does not carry.
    let extra: Vec<Record> = observed
        .records()
        .filter(|r| !master.contains_key(&r.key()))
        .cloned()
        .collect();

    // 3) Conflicts: same account, other relationship, and the publisher's
    //    variant is not itself authorized by master.
    let mut by_account: BTreeMap<AccountKey, Vec<&Record>> = BTreeMap::new();
    for r in extra.iter() {
        by_account.entry(r.account()).or_default().push(r);
    }
    let mut conflicts: Vec<RelationshipConflict> = Vec::new();
    for m in master.records() {
        if let Some(candidates) = by_account.get(&m.account()) {
            for p in candidates {
                if p.relationship() != m.relationship() {
                    conflicts.push(RelationshipConflict {
                        master: m.clone(),
                        publisher: (*p).clone(),
                    });
                }
            }
        }
    }
    conflicts.sort();

    let status = if missing.is_empty() && conflicts.is_empty() {
        PublisherStatus::Ok
    } else {
        PublisherStatus::MissingRecords
    };

    ReconciliationResult {
        status,
        missing,
        extra,
        conflicts,
        failure_reason: None,
        publisher_record_count: observed.len(),
        malformed,
        source_url: None,
    }
}

/// Parse `text` and reconcile it.
pub fn reconcile_text(master: &MasterList, text: &str) -> ReconciliationResult {
    reconcile(master, &RecordList::load(text))
}

/// UNREACHABLE result carrying the failure reason.
pub fn reconcile_failure(failure: FetchFailure) -> ReconciliationResult {
    let mut result = ReconciliationResult::empty(PublisherStatus::Unreachable);
    result.failure_reason = Some(failure);
    result
}

/// Reconcile whatever the fetch collaborator produced.
pub fn reconcile_outcome(master: &MasterList, outcome: FetchOutcome) -> ReconciliationResult {
    match outcome {
        Ok(fetched) => reconcile_text(master, &fetched.text).with_source_url(fetched.url),
        Err(failure) => reconcile_failure(failure),
    }
}
