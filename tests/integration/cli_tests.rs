//! CLI integration tests
//!
//! These tests run the resshrink binary against the sample app fixture.

mod common;

use assert_cmd::Command;
use common::{entry, read_zip, Fixture};
use predicates::prelude::*;
use resshrink::shrinker::TINY_PNG;

fn resshrink() -> Command {
    Command::cargo_bin("resshrink").unwrap()
}

/// Command with the sample app's module flags already set
fn sample_command(fixture: &Fixture) -> Command {
    let mut cmd = resshrink();
    cmd.arg(fixture.path(""))
        .arg("--symbols")
        .arg(fixture.path("R.txt"))
        .args(["--package", "com.example"])
        .arg("--res")
        .arg(fixture.path("res"))
        .arg("--manifest")
        .arg(fixture.path("AndroidManifest.xml"))
        .arg("--code")
        .arg(fixture.path("smali"));
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    resshrink()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resshrink"))
        .stdout(predicate::str::contains("--precise"))
        .stdout(predicate::str::contains("--multi-package"));
}

#[test]
fn test_cli_version() {
    resshrink()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("resshrink"));
}

#[test]
fn test_cli_invalid_format() {
    resshrink()
        .args(["--format", "sarif"])
        .assert()
        .failure();
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_cli_json_report() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let output = sample_command(&fixture)
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_resources"], 10);
    assert_eq!(report["unused_count"], 1);
    assert_eq!(report["unused"][0]["type"], "drawable");
    assert_eq!(report["unused"][0]["name"], "unused");
    assert_eq!(report["unused"][0]["id"], "0x7f020001");
}

#[test]
fn test_cli_terminal_report() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    sample_command(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("unused"))
        .stdout(predicate::str::contains("ic_launcher").not());
}

#[test]
fn test_cli_writes_dumps() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let dump = fixture.path("model.txt");
    let config = fixture.path("resources.cfg");

    sample_command(&fixture)
        .arg("--dump")
        .arg(&dump)
        .arg("--config-output")
        .arg(&config)
        .arg("--quiet")
        .assert()
        .success();

    let dump = std::fs::read_to_string(dump).unwrap();
    assert!(dump.contains("@drawable/unused : reachable=false"));
    assert!(dump.contains("@layout/activity_main : reachable=true"));

    let config = std::fs::read_to_string(config).unwrap();
    assert!(config.lines().any(|l| l == "drawable/unused#remove"));
    assert!(config.lines().any(|l| l == "drawable/ic_launcher#"));
}

#[test]
fn test_cli_config_file() {
    let fixture = Fixture::new();
    fixture.sample_app("app/");
    fixture.write(
        "resshrink.yml",
        r#"modules:
  - name: base
    package: com.example
    symbols: app/R.txt
    resources: [app/res]
    manifest: app/AndroidManifest.xml
    code: [app/smali]
"#,
    );

    let output = resshrink()
        .arg(fixture.path(""))
        .arg("--config")
        .arg(fixture.path("resshrink.yml"))
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["unused_count"], 1);
    assert_eq!(report["unused"][0]["files"][0], "res/drawable/unused.png");
}

// ============================================================================
// Rewriting
// ============================================================================

#[test]
fn test_cli_rewrites_archive() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let input = fixture.sample_apk("app.apk");
    let output = fixture.path("app-shrunk.apk");

    sample_command(&fixture)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 6 entries replaced"));

    let entries = read_zip(&output);
    assert_eq!(entry(&entries, "res/drawable/unused.png"), Some(TINY_PNG));
}

#[test]
fn test_cli_output_requires_input() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    sample_command(&fixture)
        .arg("--output")
        .arg(fixture.path("out.apk"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input is required"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_cli_missing_resource_table() {
    let fixture = Fixture::new();
    fixture.write("notes.txt", "nothing to shrink here");

    resshrink()
        .arg(fixture.path(""))
        .assert()
        .failure()
        .stderr(predicate::str::contains("resource table or symbol file"));
}

#[test]
fn test_cli_symbols_without_package() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    resshrink()
        .arg(fixture.path(""))
        .arg("--symbols")
        .arg(fixture.path("R.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("package name"));
}
