//! Integration tests for graph-level rules (G001–G004).

#[allow(dead_code)]
mod helpers;

use helpers::*;
use pipecheck::Phase;

#[test]
fn valid_fixture_has_no_graph_findings() {
    let report = report_for(include_str!("fixtures/valid_pipeline.yaml"));
    assert!(report.findings().all(|f| f.phase != Phase::Graph), "{:#?}", report);
}

#[test]
fn two_node_cycle_reported_once() {
    let report = report_for(include_str!("fixtures/cycle.yaml"));
    let cycles = with_code(&report, "G001");
    assert_eq!(cycles.len(), 1, "{:#?}", report);
    assert!(cycles[0].message.contains('A'));
    assert!(cycles[0].message.contains('B'));
    assert_eq!(cycles[0].message, "Cycle detected: A -> B -> A");
    assert_eq!(error_codes(&report), vec!["G001"]);
}

#[test]
fn self_loop_is_a_cycle() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: loop
    type: log_transform
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: loop
  - from: loop
    to: loop
  - from: loop
    to: out
"#,
    ));
    let cycles = with_code(&report, "G001");
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].message, "Cycle detected: loop -> loop");
}

#[test]
fn distinct_cycles_each_reported() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: a
    type: log_transform
  - name: b
    type: log_transform
  - name: c
    type: log_transform
  - name: d
    type: log_transform
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: a
  - from: a
    to: b
  - from: b
    to: a
  - from: b
    to: c
  - from: c
    to: d
  - from: d
    to: c
  - from: d
    to: out
"#,
    ));
    assert_eq!(with_code(&report, "G001").len(), 2);
    assert_no_code(&report, "G002");
}

#[test]
fn no_path_from_input_to_output() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: mid
    type: log_transform
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: mid
  - from: out
    to: mid
"#,
    ));
    let unreachable = with_code(&report, "G002");
    assert_eq!(unreachable.len(), 1);
    assert!(unreachable[0].message.starts_with("No path from input to output"));
    assert!(!report.valid);
}

#[test]
fn missing_output_node() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: files
    type: file_input
links:
  - from: files
    to: ed_self_telemetry_input
"#,
    ));
    let unreachable = with_code(&report, "G002");
    assert_eq!(unreachable.len(), 1);
    assert!(unreachable[0].message.contains("no output node"));
}

#[test]
fn nodes_without_links_cannot_reach_output() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: out
    type: ed_output
links: []
"#,
    ));
    assert_has_code(&report, "G002");
    assert_eq!(with_code(&report, "G003").len(), 2);
}

#[test]
fn single_node_skips_reachability() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
links: []
"#,
    ));
    assert!(report.valid, "{:#?}", report);
    assert_no_code(&report, "G002");
    assert_no_code(&report, "G003");
}

#[test]
fn isolated_node_is_a_warning() {
    let report = report_for(include_str!("fixtures/with_telemetry.yaml"));
    let isolated = with_code(&report, "G003");
    assert_eq!(isolated.len(), 1);
    assert_eq!(isolated[0].locator.as_deref(), Some("ed_self_telemetry_input"));
    assert!(report.valid);
}

#[test]
fn duplicate_link_is_a_warning() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: out
  - from: ed_self_telemetry_input
    to: out
"#,
    ));
    let dups = with_code(&report, "G004");
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].locator.as_deref(), Some("links[1]"));
    assert!(report.valid);
}

#[test]
fn compound_node_is_neither_input_nor_output() {
    let report = report_for(&pipeline(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: combo
    type: sequence
    processors:
      - type: sequence
        processors:
          - type: sample
      - type: dedup
        final: true
  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: combo
  - from: combo
    to: out
"#,
    ));
    assert!(report.valid, "{:#?}", report);
}
