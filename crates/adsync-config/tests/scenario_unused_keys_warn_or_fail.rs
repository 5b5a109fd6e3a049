//! Unused-key guard.
//!
//! GREEN when:
//! - unused keys are reported under Warn without error
//! - unused keys fail under Fail
//! - keys under consumed prefixes are not flagged

use adsync_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

const YAML: &str = r#"
master:
  path: master.txt
  header: "Master list"
publishers:
  inline:
    - domain: one.example
fetch:
  timeout_secs: 10
report:
  out_dir: out
legacy:
  slack_webhook: none
"#;

#[test]
fn check_mode_flags_only_unread_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Check, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/legacy/slack_webhook".to_string(), "/master/header".to_string()]
    );
}

#[test]
fn update_mode_reads_header_but_not_fetch() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Update, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert!(report
        .unused_leaf_pointers
        .contains(&"/fetch/timeout_secs".to_string()));
    assert!(!report
        .unused_leaf_pointers
        .contains(&"/master/header".to_string()));
}

#[test]
fn fail_policy_errors_with_pointer_list() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(ConfigMode::Check, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("/legacy/slack_webhook"));
}
