use pipecheck::parse;
use pipecheck::report::{Finding, Report};
use pipecheck::validate;

// =============================================================================
// Document builders
// =============================================================================

/// Header shared by hand-written test pipelines.
pub const HEADER: &str = "version: v3\nsettings:\n  tag: test\n";

/// Prefix `body` (top-level `nodes:` / `links:` YAML) with a valid header.
pub fn pipeline(body: &str) -> String {
    format!("{}{}", HEADER, body.trim_start_matches('\n'))
}

/// A fully valid pipeline whose middle node carries the given processor list.
/// `processors` is YAML at six-space indentation, e.g. `"      - type: sample\n"`.
pub fn pipeline_with_processors(processors: &str) -> String {
    pipeline(&format!(
        r#"
nodes:
  - name: ed_self_telemetry_input
    type: ed_self_telemetry_input
  - name: src
    type: file_input
  - name: seq
    type: sequence
    processors:
{}  - name: out
    type: ed_output
links:
  - from: ed_self_telemetry_input
    to: out
  - from: src
    to: seq
  - from: seq
    to: out
"#,
        processors
    ))
}

// =============================================================================
// Report helpers
// =============================================================================

pub fn report_for(yaml: &str) -> Report {
    let document = parse::parse(yaml).expect("pipeline should load");
    validate::validate(&document)
}

pub fn with_code<'a>(report: &'a Report, code: &str) -> Vec<&'a Finding> {
    report.findings().filter(|f| f.code == code).collect()
}

pub fn assert_has_code(report: &Report, code: &str) {
    assert!(
        report.has_code(code),
        "Expected finding {}, got: {:#?}",
        code,
        report
    );
}

pub fn assert_no_code(report: &Report, code: &str) {
    assert!(
        !report.has_code(code),
        "Did not expect finding {}, but got: {:#?}",
        code,
        report
    );
}

pub fn error_codes(report: &Report) -> Vec<&str> {
    report.errors.iter().map(|f| f.code.as_str()).collect()
}
