//! Master canonicalization scenarios.
//!
//! GREEN when:
//! - a certification-bearing duplicate replaces its certless twin
//! - canonicalize is a fixed point
//! - permuted input lines produce byte-identical output
//! - the master's comments and malformed lines never reach the canonical text

use adsync_records::{MasterChange, MasterList, Record, RecordList, Relationship};

const MASTER: &str = "\
# Source of truth
google.com, pub-0001, DIRECT, f08c47fec0942fa0
x.com, 123, DIRECT
appnexus.com, 77, reseller
x.com, 123, DIRECT, cert1
this line is broken
contact=adops@example.com
X.COM, 123, RESELLER
";

#[test]
fn certification_bearing_duplicate_wins() {
    let canon = RecordList::load("x.com, 123, DIRECT\nx.com, 123, DIRECT, cert1\n").canonicalize();
    let records: Vec<&Record> = canon.records().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(
        *records[0],
        Record::new("x.com", "123", Relationship::Direct).with_certification("cert1")
    );
}

#[test]
fn master_canonical_text_is_stable() {
    let master = MasterList::from_text(MASTER).unwrap();
    assert_eq!(
        master.list().serialize(),
        "appnexus.com, 77, RESELLER\n\
         google.com, pub-0001, DIRECT, f08c47fec0942fa0\n\
         x.com, 123, DIRECT, cert1\n\
         x.com, 123, RESELLER\n"
    );

    let again = MasterList::from_text(&master.list().serialize()).unwrap();
    assert_eq!(again.list(), master.list());
    assert!(again.changes().is_noop());
}

#[test]
fn master_change_summary_lists_dedup_and_reformat() {
    let master = MasterList::from_text(MASTER).unwrap();
    let change = MasterChange::from_canonicalize(master.changes());
    assert!(change.added.is_empty());
    assert_eq!(change.deduped_away.len(), 1);
    assert_eq!(change.deduped_away[0].certification_authority_id(), None);
    // "appnexus.com, 77, reseller" and "X.COM, 123, RESELLER"
    assert_eq!(change.reformatted.len(), 2);
    assert_eq!(master.changes().malformed.len(), 1);
    assert_eq!(master.changes().malformed[0].line_no, 6);
}

#[test]
fn permutations_canonicalize_identically() {
    let lines: Vec<&str> = MASTER.lines().collect();
    let expected = RecordList::load(MASTER).canonicalize().serialize();

    // Every rotation, forwards and backwards.
    for shift in 0..lines.len() {
        let mut v = lines.clone();
        v.rotate_left(shift);
        assert_eq!(RecordList::load(&v.join("\n")).canonicalize().serialize(), expected);
        v.reverse();
        assert_eq!(RecordList::load(&v.join("\n")).canonicalize().serialize(), expected);
    }
}
