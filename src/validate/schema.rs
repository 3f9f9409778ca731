//! Required keys and per-entry shape (S001–S017).

use serde_yaml::Value;

use crate::error::Phase;
use crate::parse::types::{Document, Section, kind_of};
use crate::report::Finding;
use crate::rules::RuleSet;

/// Run all schema rules. Every defect is reported; nothing short-circuits.
pub fn validate_schema(document: &Document, rules: &RuleSet) -> Vec<Finding> {
    let mut errors = Vec::new();

    check_version(document, rules, &mut errors);
    check_settings(document, &mut errors);
    check_nodes_section(document, &mut errors);
    check_links_section(document, &mut errors);
    check_node_fields(document, &mut errors);
    check_link_fields(document, &mut errors);
    check_required_node(document, rules, &mut errors);

    errors
}

fn schema_error(code: &str, message: impl Into<String>, locator: Option<String>) -> Finding {
    Finding::error(Phase::Schema, code, message, locator)
}

fn check_version(document: &Document, rules: &RuleSet, errors: &mut Vec<Finding>) {
    match &document.version {
        None | Some(Value::Null) => errors.push(
            schema_error("S001", "Missing required field 'version'", None)
                .with_suggestion(format!("add `version: {}`", rules.version)),
        ),
        Some(Value::String(v)) if *v == rules.version => {}
        Some(Value::String(v)) => errors.push(
            schema_error(
                "S002",
                format!("Unsupported version '{}', must be '{}'", v, rules.version),
                Some("version".into()),
            )
            .with_suggestion(format!("set `version: {}`", rules.version)),
        ),
        Some(other) => errors.push(schema_error(
            "S002",
            format!(
                "'version' must be the string '{}', found {}",
                rules.version,
                kind_of(other)
            ),
            Some("version".into()),
        )),
    }
}

fn check_settings(document: &Document, errors: &mut Vec<Finding>) {
    let settings = match &document.settings {
        None | Some(Value::Null) => {
            errors.push(schema_error("S003", "Missing required field 'settings'", None));
            return;
        }
        Some(Value::Mapping(map)) => map,
        Some(other) => {
            errors.push(schema_error(
                "S003",
                format!("'settings' must be a mapping, found {}", kind_of(other)),
                Some("settings".into()),
            ));
            return;
        }
    };

    match settings.get("tag") {
        None | Some(Value::Null) => errors.push(schema_error(
            "S004",
            "Missing required field 'settings.tag'",
            Some("settings".into()),
        )),
        Some(Value::String(tag)) if tag.trim().is_empty() => errors.push(schema_error(
            "S004",
            "'settings.tag' must not be empty",
            Some("settings.tag".into()),
        )),
        Some(Value::String(_)) => {}
        Some(other) => errors.push(schema_error(
            "S004",
            format!("'settings.tag' must be a string, found {}", kind_of(other)),
            Some("settings.tag".into()),
        )),
    }
}

fn check_nodes_section(document: &Document, errors: &mut Vec<Finding>) {
    match &document.nodes {
        Section::Missing => {
            errors.push(schema_error("S005", "Missing required field 'nodes'", None));
        }
        Section::Invalid { found } => errors.push(schema_error(
            "S005",
            format!("'nodes' must be a list, found {}", found),
            Some("nodes".into()),
        )),
        Section::Present(nodes) if nodes.is_empty() => errors.push(schema_error(
            "S006",
            "No nodes defined in pipeline",
            Some("nodes".into()),
        )),
        Section::Present(_) => {}
    }
}

fn check_links_section(document: &Document, errors: &mut Vec<Finding>) {
    match &document.links {
        Section::Missing => {
            errors.push(schema_error("S007", "Missing required field 'links'", None));
        }
        Section::Invalid { found } => errors.push(schema_error(
            "S008",
            format!("'links' must be a list, found {}", found),
            Some("links".into()),
        )),
        Section::Present(_) => {}
    }
}

fn check_node_fields(document: &Document, errors: &mut Vec<Finding>) {
    for node in document.nodes.entries() {
        let locator = Some(node.label());

        if let Some(found) = node.malformed {
            errors.push(schema_error(
                "S009",
                format!("Node {} is not a mapping (found {})", node.index, found),
                Some(format!("nodes[{}]", node.index)),
            ));
            continue;
        }
        if node.name().is_none() {
            errors.push(schema_error(
                "S010",
                format!("Node {} is missing a non-empty 'name'", node.index),
                locator.clone(),
            ));
        }
        if node.node_type().is_none() {
            errors.push(schema_error(
                "S011",
                format!("Node '{}' is missing a non-empty 'type'", node.label()),
                locator.clone(),
            ));
        }
        if let Section::Invalid { found } = &node.processors {
            errors.push(schema_error(
                "S017",
                format!(
                    "Node '{}' has 'processors' that is not a list (found {})",
                    node.label(),
                    found
                ),
                locator,
            ));
        }
    }
}

fn check_link_fields(document: &Document, errors: &mut Vec<Finding>) {
    for link in document.links.entries() {
        let locator = Some(format!("links[{}]", link.index));

        if let Some(found) = link.malformed {
            errors.push(schema_error(
                "S012",
                format!("Link {} is not a mapping (found {})", link.index, found),
                locator,
            ));
            continue;
        }
        if link.from().is_none() {
            errors.push(schema_error(
                "S013",
                format!("Link {} is missing 'from'", link.index),
                locator.clone(),
            ));
        }
        if link.to().is_none() {
            errors.push(schema_error(
                "S014",
                format!("Link {} is missing 'to'", link.index),
                locator,
            ));
        }
    }
}

/// The remote API rejects documents without exactly one self-telemetry input.
fn check_required_node(document: &Document, rules: &RuleSet, errors: &mut Vec<Finding>) {
    let required = rules.required_node_type.as_str();
    let matches: Vec<_> = document
        .nodes
        .entries()
        .iter()
        .filter(|n| n.node_type() == Some(required))
        .collect();

    match matches.len() {
        0 => errors.push(
            schema_error(
                "S015",
                format!("Required node missing: no node of type '{}'", required),
                None,
            )
            .with_suggestion(format!(
                "add a node `{{ name: {0}, type: {0} }}`",
                required
            )),
        ),
        1 => {}
        n => errors.push(schema_error(
            "S016",
            format!(
                "Node type '{}' must appear exactly once, found {} ({})",
                required,
                n,
                matches
                    .iter()
                    .map(|node| node.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Some(matches[1].label()),
        )),
    }
}
