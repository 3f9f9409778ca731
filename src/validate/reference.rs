//! Name index and link resolution (R001–R002).

use std::collections::HashMap;

use crate::error::Phase;
use crate::parse::types::{Document, Section};
use crate::report::Finding;

/// Names of the first node carrying each name, keyed to its list position.
pub fn name_index(document: &Document) -> HashMap<&str, usize> {
    let mut index = HashMap::new();
    for node in document.nodes.entries() {
        if let Some(name) = node.name() {
            index.entry(name).or_insert(node.index);
        }
    }
    index
}

pub fn validate_references(document: &Document) -> Vec<Finding> {
    let mut errors = Vec::new();

    check_duplicate_names(document, &mut errors);

    // Without a node list every link would look dangling; schema already reported it.
    if matches!(document.nodes, Section::Present(_)) {
        check_link_targets(document, &name_index(document), &mut errors);
    }

    errors
}

fn check_duplicate_names(document: &Document, errors: &mut Vec<Finding>) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for node in document.nodes.entries() {
        let Some(name) = node.name() else { continue };
        match first_seen.get(name) {
            Some(&first) => errors.push(
                Finding::error(
                    Phase::Reference,
                    "R001",
                    format!(
                        "Duplicate node name '{}' at nodes[{}] (first defined at nodes[{}])",
                        name, node.index, first
                    ),
                    Some(name.to_string()),
                )
                .with_suggestion("rename nodes so every name is unique"),
            ),
            None => {
                first_seen.insert(name, node.index);
            }
        }
    }
}

fn check_link_targets(
    document: &Document,
    index: &HashMap<&str, usize>,
    errors: &mut Vec<Finding>,
) {
    for link in document.links.entries() {
        for (end, name) in [("from", link.from()), ("to", link.to())] {
            let Some(name) = name else { continue };
            if !index.contains_key(name) {
                errors.push(Finding::error(
                    Phase::Reference,
                    "R002",
                    format!(
                        "Link {} references unknown '{}' node '{}'",
                        link.index, end, name
                    ),
                    Some(format!("links[{}]", link.index)),
                ));
            }
        }
    }
}
