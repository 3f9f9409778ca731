//! Integration tests for the load phase: YAML → Document, graph building.

use pipecheck::LoadError;
use pipecheck::parse::{self, PipelineGraph, Section, Step};

#[test]
fn parse_valid_fixture() {
    let yaml = include_str!("fixtures/valid_pipeline.yaml");
    let document = parse::parse(yaml).expect("Should parse successfully");
    assert_eq!(document.tag(), Some("checkout-service"));
    assert_eq!(document.nodes.entries().len(), 4);
    assert_eq!(document.links.entries().len(), 3);
    assert!(document.source.is_some());
}

#[test]
fn parse_keeps_node_fields() {
    let yaml = include_str!("fixtures/valid_pipeline.yaml");
    let document = parse::parse(yaml).unwrap();
    let seq = &document.nodes.entries()[2];
    assert_eq!(seq.name(), Some("app_processing"));
    assert_eq!(seq.node_type(), Some("sequence"));
    assert_eq!(seq.processors.entries().len(), 3);
    assert!(seq.processors.entries()[2].is_final());
    assert!(seq.params.contains_key("user_description"));
}

#[test]
fn parse_invalid_yaml_returns_load_error() {
    let err = parse::parse(include_str!("fixtures/unparsable.yaml")).unwrap_err();
    assert!(matches!(err, LoadError::Yaml(_)));
    assert_eq!(err.code(), "P001");
}

#[test]
fn parse_non_mapping_root() {
    let err = parse::parse("- just\n- a list\n").unwrap_err();
    assert_eq!(err.code(), "P002");
    assert!(err.to_string().contains("list"));
}

#[test]
fn parse_empty_document() {
    assert!(parse::parse("").is_err());
    assert_eq!(parse::parse("~\n").unwrap_err().code(), "P003");
}

#[test]
fn load_missing_file() {
    let err = parse::load_file(std::path::Path::new("does/not/exist.yaml")).unwrap_err();
    assert_eq!(err.code(), "P004");
}

#[test]
fn mistyped_sections_are_kept_not_rejected() {
    let document = parse::parse("version: v3\nnodes: 7\nlinks: {}\n").unwrap();
    assert_eq!(document.nodes, Section::Invalid { found: "number" });
    assert_eq!(document.links, Section::Invalid { found: "mapping" });
    assert!(document.nodes.entries().is_empty());
}

#[test]
fn nested_sequence_becomes_nested_step() {
    let yaml = r#"
nodes:
  - name: outer
    type: sequence
    processors:
      - type: sample
      - type: sequence
        processors:
          - type: dedup
          - "not a step"
"#;
    let document = parse::parse(yaml).unwrap();
    let outer = &document.nodes.entries()[0];
    assert!(outer.has_nested_sequence());
    let Step::Nested { steps, .. } = &outer.processors.entries()[1] else {
        panic!("expected nested step");
    };
    let inner = steps.entries();
    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0].step_type(), Some("dedup"));
    assert!(matches!(inner[1], Step::Malformed { found: "string", .. }));
}

#[test]
fn numeric_names_are_read_as_strings() {
    let document = parse::parse("nodes:\n  - name: 42\n    type: file_input\n").unwrap();
    assert_eq!(document.nodes.entries()[0].name(), Some("42"));
}

#[test]
fn build_graph_from_fixture() {
    let yaml = include_str!("fixtures/valid_pipeline.yaml");
    let document = parse::parse(yaml).unwrap();
    let graph = PipelineGraph::build(&document);
    assert_eq!(graph.node_indices.len(), 4);
    assert_eq!(graph.outgoing_count("app_logs"), 1);
    assert_eq!(graph.incoming_count("edgedelta"), 2);
    assert_eq!(graph.successors("app_processing"), vec!["edgedelta"]);
    assert!(graph.has_path("app_logs", "edgedelta"));
    assert!(!graph.has_path("edgedelta", "app_logs"));
}

#[test]
fn graph_skips_unresolved_links_and_duplicate_names() {
    let yaml = r#"
nodes:
  - name: a
    type: file_input
  - name: a
    type: ed_output
links:
  - from: a
    to: ghost
"#;
    let document = parse::parse(yaml).unwrap();
    let graph = PipelineGraph::build(&document);
    assert_eq!(graph.graph.node_count(), 1);
    assert_eq!(graph.graph.edge_count(), 0);
    assert!(graph.node_indices.contains_key("a"));
    assert!(!graph.node_indices.contains_key("ghost"));
    assert!(!graph.has_path("a", "ghost"));
}
