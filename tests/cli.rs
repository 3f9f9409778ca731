//! Command-line behaviour: exit codes, output formats, rule overrides.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn pipecheck() -> Command {
    Command::cargo_bin("pipecheck").unwrap()
}

#[test]
fn valid_pipeline_exits_zero() {
    pipecheck()
        .arg(fixture("valid_pipeline.yaml"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("0 error(s), 0 warning(s): VALID"));
}

#[test]
fn warnings_still_exit_zero() {
    pipecheck()
        .arg(fixture("with_telemetry.yaml"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Warnings (1):"))
        .stdout(predicate::str::contains("[G003]"));
}

#[test]
fn invalid_pipeline_exits_one() {
    pipecheck()
        .arg(fixture("missing_telemetry.yaml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[S015]"))
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn unparsable_file_exits_two() {
    pipecheck()
        .arg(fixture("unparsable.yaml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[P001]"));
}

#[test]
fn missing_file_exits_two() {
    pipecheck()
        .arg(fixture("does_not_exist.yaml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[P004]"));
}

#[test]
fn json_format() {
    let output = pipecheck()
        .args([&fixture("cycle.yaml"), "--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["code"], "G001");
}

#[test]
fn json_load_error() {
    let output = pipecheck()
        .args([&fixture("unparsable.yaml"), "--format", "json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["load_error"]["code"], "P001");
}

#[test]
fn rules_file_extends_whitelist() {
    let mut pipeline = NamedTempFile::new().unwrap();
    write!(
        pipeline,
        "version: v3
settings:
  tag: lookup
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: seq
    type: sequence
    processors:
      - type: lookup
        final: true
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: seq
  - from: seq
    to: out
"
    )
    .unwrap();

    pipecheck()
        .arg(pipeline.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[Q001]"));

    let mut rules = NamedTempFile::new().unwrap();
    writeln!(rules, "extra_processors = [\"lookup\"]").unwrap();

    pipecheck()
        .arg(pipeline.path())
        .arg("--rules")
        .arg(rules.path())
        .assert()
        .code(0);
}

#[test]
fn bad_rules_file_exits_two() {
    let mut rules = NamedTempFile::new().unwrap();
    writeln!(rules, "unknown_key = true").unwrap();

    pipecheck()
        .arg(fixture("valid_pipeline.yaml"))
        .arg("--rules")
        .arg(rules.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid rules file"));
}

#[test]
fn verbose_logs_phases_to_stderr() {
    pipecheck()
        .arg(fixture("valid_pipeline.yaml"))
        .arg("--verbose")
        .env_remove("RUST_LOG")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("schema phase done"));
}
