//! Config-driven commands end to end.
//!
//! GREEN when:
//! - `check` against an unreachable publisher still writes the run directory
//!   and reports UNREACHABLE; `--fail-on-drift` turns that into exit 1
//! - `check` without a master is fatal (exit 2)
//! - `update --dry-run` reports partner additions without touching the master
//! - `config-hash` is stable under key reordering

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn adsync() -> Command {
    Command::cargo_bin("adsync").unwrap()
}

fn write_check_config(dir: &Path) -> std::path::PathBuf {
    let master = dir.join("master.txt");
    fs::write(&master, "a.com, 1, DIRECT\n").unwrap();
    let cfg = dir.join("adsync.yaml");
    fs::write(
        &cfg,
        format!(
            "master:\n  path: {master}\n\
             publishers:\n  inline:\n    - domain: \"127.0.0.1:1\"\n      name: Nowhere\n\
             fetch:\n  timeout_secs: 2\n  max_attempts: 1\n  concurrency: 2\n\
             report:\n  out_dir: {out}\n",
            master = master.display(),
            out = dir.join("exports").display()
        ),
    )
    .unwrap();
    cfg
}

#[test]
fn scenario_check_unreachable_publisher_is_reported() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = write_check_config(tmp.path());

    adsync()
        .arg("check")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(predicate::str::contains("unreachable=1"))
        .stdout(predicate::str::contains("compliance=DRIFT"));

    adsync()
        .arg("check")
        .arg("--config")
        .arg(&cfg)
        .arg("--fail-on-drift")
        .assert()
        .code(1);

    let runs: Vec<_> = fs::read_dir(tmp.path().join("exports"))?
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(runs.len(), 2);
    for run in runs {
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(run.path().join("report.json"))?)?;
        assert_eq!(report["publishers"]["127.0.0.1:1"]["status"], "UNREACHABLE");
        assert!(run.path().join("report.md").is_file());
        assert!(run.path().join("manifest.json").is_file());
    }
    Ok(())
}

#[test]
fn scenario_check_without_master_is_fatal() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = tmp.path().join("adsync.yaml");
    fs::write(&cfg, "publishers:\n  inline:\n    - domain: pub.example\n")?;

    adsync()
        .arg("check")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no master file"));
    Ok(())
}

#[test]
fn scenario_update_dry_run_leaves_master() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let master = tmp.path().join("master.txt");
    let partners = tmp.path().join("partners");
    fs::create_dir(&partners)?;
    fs::write(&master, "a.com, 1, DIRECT\n")?;
    fs::write(partners.join("p1.txt"), "a.com, 1, DIRECT\nc.com, 3, RESELLER\n")?;

    adsync()
        .arg("update")
        .arg("--master")
        .arg(&master)
        .arg("--partners-dir")
        .arg(&partners)
        .arg("--out-dir")
        .arg(tmp.path().join("exports"))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("records_before=1"))
        .stdout(predicate::str::contains("records_after=2"))
        .stdout(predicate::str::contains("added=1"));
    assert_eq!(fs::read_to_string(&master)?, "a.com, 1, DIRECT\n");

    adsync()
        .arg("update")
        .arg("--master")
        .arg(&master)
        .arg("--partners-dir")
        .arg(&partners)
        .arg("--out-dir")
        .arg(tmp.path().join("exports"))
        .assert()
        .success();
    let written = fs::read_to_string(&master)?;
    assert!(written.contains("a.com, 1, DIRECT\nc.com, 3, RESELLER\n"));
    Ok(())
}

#[test]
fn scenario_config_hash_ignores_key_order() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let a = tmp.path().join("a.yaml");
    let b = tmp.path().join("b.yaml");
    fs::write(&a, "fetch:\n  timeout_secs: 5\n  concurrency: 4\nreport:\n  out_dir: x\n")?;
    fs::write(&b, "report:\n  out_dir: x\nfetch:\n  concurrency: 4\n  timeout_secs: 5\n")?;

    let hash = |p: &Path| -> anyhow::Result<String> {
        let out = adsync().arg("config-hash").arg(p).output()?;
        assert!(out.status.success());
        let stdout = String::from_utf8(out.stdout)?;
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    };
    let ha = hash(&a)?;
    assert!(ha.starts_with("config_hash="));
    assert_eq!(ha, hash(&b)?);
    Ok(())
}
