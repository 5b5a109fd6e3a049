//! sellers.json cross-check against the master.
//!
//! GREEN when:
//! - ids the master lists for the system domain raise nothing
//! - unknown ids produce exactly one warning, sorted
//! - the system domain is matched case-insensitively
//! - warnings never make the document invalid

use adsync_records::MasterList;
use adsync_sellers::{check_sellers, missing_seller_ids, parse_sellers_json, Severity};

const MASTER: &str = "\
exchange.example, 100, DIRECT
exchange.example, 200, RESELLER
other.example, 300, DIRECT
";

const SELLERS: &str = r#"{
  "version": "1.0",
  "contact_email": "ops@exchange.example",
  "sellers": [
    {"seller_id": "300", "seller_type": "PUBLISHER", "name": "C", "domain": "c.example"},
    {"seller_id": "100", "seller_type": "PUBLISHER", "name": "A", "domain": "a.example"},
    {"seller_id": "250", "seller_type": "INTERMEDIARY", "name": "B", "domain": "b.example"},
    {"seller_id": 200, "seller_type": "BOTH", "name": "D", "domain": "d.example"}
  ]
}"#;

#[test]
fn scenario_unknown_seller_ids_warn_once() {
    let master = MasterList::from_text(MASTER).unwrap();
    let doc = parse_sellers_json(SELLERS).unwrap();

    assert_eq!(
        missing_seller_ids(&doc, &master, "Exchange.Example"),
        vec!["250".to_string(), "300".to_string()]
    );

    let report = check_sellers(&doc, &master, "exchange.example");
    assert!(report.is_valid());
    assert_eq!(report.seller_count, 4);

    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert!(warnings[0]
        .message
        .starts_with("2 seller_id(s) not found in master records for exchange.example: 250, 300"));
}

#[test]
fn scenario_fully_listed_sellers_are_clean() {
    let master = MasterList::from_text(MASTER).unwrap();
    let doc = parse_sellers_json(SELLERS).unwrap();

    let report = check_sellers(&doc, &master, "nowhere.example");
    // Every id is unknown for a system domain the master never mentions.
    assert_eq!(report.warnings().count(), 1);

    let listed = parse_sellers_json(
        r#"{"version": "1.0", "sellers": [
            {"seller_id": "100", "seller_type": "PUBLISHER", "name": "A", "domain": "a.example"}
        ]}"#,
    )
    .unwrap();
    let report = check_sellers(&listed, &master, "exchange.example");
    assert!(report.findings.is_empty());
}
