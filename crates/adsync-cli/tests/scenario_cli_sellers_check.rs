//! `sellers-check` exit codes.
//!
//! GREEN when:
//! - a valid file exits 0, even with cross-check warnings
//! - structural errors exit 1
//! - a missing file or invalid JSON exits 2

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn adsync() -> Command {
    Command::cargo_bin("adsync").unwrap()
}

const VALID: &str = r#"{"version": "1.0", "sellers": [
  {"seller_id": "100", "seller_type": "PUBLISHER", "name": "A", "domain": "a.example"},
  {"seller_id": "999", "seller_type": "PUBLISHER", "name": "B", "domain": "b.example"}
]}"#;

#[test]
fn scenario_valid_file_with_cross_check_warning() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let sellers = tmp.path().join("sellers.json");
    let master = tmp.path().join("master.txt");
    fs::write(&sellers, VALID)?;
    fs::write(&master, "exchange.example, 100, DIRECT\n")?;

    adsync()
        .arg("sellers-check")
        .arg("--file")
        .arg(&sellers)
        .arg("--master")
        .arg(&master)
        .args(["--system-domain", "exchange.example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WARN sellers: 1 seller_id(s) not found"))
        .stdout(predicate::str::contains("sellers_json=OK"));
    Ok(())
}

#[test]
fn scenario_structural_errors_exit_one() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let sellers = tmp.path().join("sellers.json");
    fs::write(&sellers, r#"{"version": "1.0", "sellers": [{"seller_type": "PUBLISHER"}]}"#)?;

    adsync()
        .arg("sellers-check")
        .arg("--file")
        .arg(&sellers)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ERROR sellers[0].seller_id"))
        .stdout(predicate::str::contains("sellers_json=INVALID"));
    Ok(())
}

#[test]
fn scenario_unreadable_input_is_fatal() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let bad = tmp.path().join("bad.json");
    fs::write(&bad, "{ nope")?;

    adsync()
        .arg("sellers-check")
        .arg("--file")
        .arg(&bad)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not valid JSON"));

    adsync()
        .arg("sellers-check")
        .arg("--file")
        .arg(tmp.path().join("missing.json"))
        .assert()
        .code(2);
    Ok(())
}
