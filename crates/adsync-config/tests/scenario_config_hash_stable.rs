//! Config hash stability.
//!
//! GREEN when:
//! - the same input hashes identically
//! - reordering keys in YAML does not change the hash
//! - overlays take effect and change the hash

use adsync_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
master:
  path: "data/master_app_ads.txt"
publishers:
  csv: "data/publishers.csv"
fetch:
  timeout_secs: 20
  concurrency: 8
report:
  out_dir: "exports"
"#;

const BASE_YAML_REORDERED: &str = r#"
report:
  out_dir: "exports"
fetch:
  concurrency: 8
  timeout_secs: 20
publishers:
  csv: "data/publishers.csv"
master:
  path: "data/master_app_ads.txt"
"#;

const OVERLAY_YAML: &str = r#"
fetch:
  concurrency: 32
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(original.config_hash, reordered.config_hash);
    assert_eq!(original.canonical_json, reordered.canonical_json);
}

#[test]
fn overlay_changes_value_and_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let cfg = merged.typed().unwrap();
    assert_eq!(cfg.fetch.concurrency, 32);
    assert_eq!(cfg.fetch.timeout_secs, 20);
}
