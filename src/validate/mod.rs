//! Validation phases and the verdict aggregator.
//!
//! Phases run in a fixed order (schema, references, topology, sequences, policy) and
//! every phase always runs. Each one tolerates the partial structures left behind by
//! schema failures, so one pass yields the complete list of defects.

pub mod policy;
pub mod reference;
pub mod schema;
pub mod sequence;
pub mod topology;

use crate::error::LoadError;
use crate::parse::graph::PipelineGraph;
use crate::parse::types::Document;
use crate::report::Report;
use crate::rules::RuleSet;

/// Validate a document against the built-in rule table.
pub fn validate(document: &Document) -> Report {
    validate_with(document, RuleSet::default_rules())
}

/// Validate a document against an explicit rule table.
pub fn validate_with(document: &Document, rules: &RuleSet) -> Report {
    tracing::debug!(
        tag = document.tag().unwrap_or("<none>"),
        version = %rules.version,
        "validating pipeline"
    );

    let mut findings = schema::validate_schema(document, rules);
    tracing::debug!(count = findings.len(), "schema phase done");

    let references = reference::validate_references(document);
    tracing::debug!(count = references.len(), "reference phase done");
    findings.extend(references);

    let graph = PipelineGraph::build(document);
    let topology = topology::validate_topology(document, &graph, rules);
    tracing::debug!(
        vertices = graph.graph.node_count(),
        edges = graph.graph.edge_count(),
        count = topology.len(),
        "graph phase done"
    );
    findings.extend(topology);

    let sequences = sequence::validate_sequences(document, rules);
    tracing::debug!(count = sequences.len(), "sequence phase done");
    findings.extend(sequences);

    let policy = policy::validate_policy(document, rules);
    tracing::debug!(count = policy.len(), "policy phase done");
    findings.extend(policy);

    Report::from_findings(findings)
}

/// Parse YAML text and validate it with the built-in rules.
pub fn validate_str(yaml: &str) -> Result<Report, LoadError> {
    let document = crate::parse::parse(yaml)?;
    Ok(validate(&document))
}
