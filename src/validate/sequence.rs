//! Processor-sequence rules (Q001–Q008).
//!
//! Each rule runs to completion for every sequence so that one pass reports every
//! violation. Nested sequences are walked with the same rules plus the restriction
//! that nothing inside them may be marked `final`.

use crate::error::Phase;
use crate::parse::types::{Document, Node, Section, Step};
use crate::report::Finding;
use crate::rules::{NESTED_SEQUENCE, RuleSet};

pub fn validate_sequences(document: &Document, rules: &RuleSet) -> Vec<Finding> {
    let mut findings = Vec::new();

    for node in document.nodes.entries() {
        validate_node_sequence(node, rules, &mut findings);
    }

    findings
}

/// Sequence rules for a single node.
pub fn validate_node_sequence(node: &Node, rules: &RuleSet, findings: &mut Vec<Finding>) {
    let label = node.label();
    let steps = node.processors.entries();

    if steps.is_empty() {
        if node.node_type() == Some(NESTED_SEQUENCE)
            && !matches!(node.processors, Section::Invalid { .. })
        {
            findings.push(Finding::warning(
                Phase::Sequence,
                "Q007",
                format!("Sequence '{}' has no processors", label),
                Some(label),
            ));
        }
        return;
    }

    tracing::trace!(node = %label, steps = steps.len(), "checking sequence");
    check_level(&label, steps, false, rules, findings);

    if !steps.iter().any(Step::is_final) {
        findings.push(
            Finding::warning(
                Phase::Sequence,
                "Q008",
                format!("Sequence '{}' has no processor with 'final: true'", label),
                Some(label),
            )
            .with_suggestion("mark the last processor with `final: true`"),
        );
    }
}

fn seq_error(code: &str, message: String, locator: String) -> Finding {
    Finding::error(Phase::Sequence, code, message, Some(locator))
}

fn step_locator(prefix: &str, index: usize) -> String {
    format!("{}.processors[{}]", prefix, index)
}

/// Apply rules 1–5 to one ordered list of steps, recursing into nested sequences.
fn check_level(
    prefix: &str,
    steps: &[Step],
    nested: bool,
    rules: &RuleSet,
    findings: &mut Vec<Finding>,
) {
    check_whitelist(prefix, steps, rules, findings);
    if nested {
        check_nested_finals(prefix, steps, findings);
    } else {
        check_single_final(prefix, steps, findings);
        check_final_is_last(prefix, steps, findings);
    }
    check_terminal_processor_last(prefix, steps, rules, findings);

    for step in steps {
        if let Step::Nested {
            index,
            is_final,
            steps: inner,
            ..
        } = step
        {
            check_nested_step(prefix, *index, *is_final, inner, rules, findings);
        }
    }
}

/// Rule 1: every leaf step type must be sequence-compatible.
fn check_whitelist(prefix: &str, steps: &[Step], rules: &RuleSet, findings: &mut Vec<Finding>) {
    for step in steps {
        let index = step.index();
        let locator = step_locator(prefix, index);
        match step {
            Step::Malformed { found, .. } => findings.push(seq_error(
                "Q006",
                format!(
                    "Processor {} in '{}' is not a mapping (found {})",
                    index, prefix, found
                ),
                locator,
            )),
            Step::Nested { .. } => {}
            Step::Leaf { .. } => match step.step_type() {
                None => findings.push(seq_error(
                    "Q006",
                    format!("Processor {} in '{}' is missing 'type'", index, prefix),
                    locator,
                )),
                Some(step_type) if !rules.is_compatible(step_type) => findings.push(seq_error(
                    "Q001",
                    format!(
                        "Processor {} in '{}' has type '{}', which is not sequence-compatible",
                        index, prefix, step_type
                    ),
                    locator,
                )),
                Some(_) => {}
            },
        }
    }
}

fn final_indices(steps: &[Step]) -> Vec<usize> {
    steps
        .iter()
        .filter(|s| s.is_final())
        .map(Step::index)
        .collect()
}

/// Rule 2: at most one step may be terminal.
fn check_single_final(prefix: &str, steps: &[Step], findings: &mut Vec<Finding>) {
    let finals = final_indices(steps);
    if finals.len() > 1 {
        let listed = finals
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(
            seq_error(
                "Q002",
                format!(
                    "Sequence '{}' has multiple processors with 'final: true' (indices {})",
                    prefix, listed
                ),
                prefix.to_string(),
            )
            .with_suggestion("keep `final: true` only on the last processor"),
        );
    }
}

/// Rule 3: a single terminal step must be the last one.
fn check_final_is_last(prefix: &str, steps: &[Step], findings: &mut Vec<Finding>) {
    let finals = final_indices(steps);
    let last = steps.len() - 1;
    if let [only] = finals.as_slice() {
        if *only != last {
            findings.push(seq_error(
                "Q003",
                format!(
                    "Sequence '{}' has 'final: true' on processor {}, but it is not the last processor",
                    prefix, only
                ),
                step_locator(prefix, *only),
            ));
        }
    }
}

/// Rule 4: the terminal processor type must be last, regardless of `final`.
fn check_terminal_processor_last(
    prefix: &str,
    steps: &[Step],
    rules: &RuleSet,
    findings: &mut Vec<Finding>,
) {
    let last = steps.len() - 1;
    for step in steps {
        let is_terminal = step
            .step_type()
            .is_some_and(|t| rules.is_terminal_processor(t));
        if is_terminal && step.index() != last {
            findings.push(
                seq_error(
                    "Q004",
                    format!(
                        "Sequence '{}' has '{}' processor at position {}, but it must be last",
                        prefix,
                        rules.terminal_processor_type,
                        step.index()
                    ),
                    step_locator(prefix, step.index()),
                )
                .with_suggestion(format!(
                    "move the '{}' processor to the end of the sequence",
                    rules.terminal_processor_type
                )),
            );
        }
    }
}

/// Rule 5: nothing inside a nested sequence may be terminal.
fn check_nested_finals(prefix: &str, steps: &[Step], findings: &mut Vec<Finding>) {
    for index in final_indices(steps) {
        findings.push(seq_error(
            "Q005",
            format!(
                "Processor {} inside nested sequence '{}' must not set 'final: true'",
                index, prefix
            ),
            step_locator(prefix, index),
        ));
    }
}

fn check_nested_step(
    prefix: &str,
    index: usize,
    is_final: bool,
    inner: &Section<Step>,
    rules: &RuleSet,
    findings: &mut Vec<Finding>,
) {
    let locator = step_locator(prefix, index);

    if is_final {
        findings.push(seq_error(
            "Q005",
            format!(
                "Nested sequence at processor {} in '{}' must not set 'final: true'",
                index, prefix
            ),
            locator.clone(),
        ));
    }

    match inner {
        Section::Invalid { found } => findings.push(seq_error(
            "Q006",
            format!(
                "Nested sequence at processor {} in '{}' has 'processors' that is not a list (found {})",
                index, prefix, found
            ),
            locator,
        )),
        Section::Missing => findings.push(empty_nested(prefix, index, locator)),
        Section::Present(steps) if steps.is_empty() => {
            findings.push(empty_nested(prefix, index, locator))
        }
        Section::Present(steps) => check_level(&locator, steps, true, rules, findings),
    }
}

fn empty_nested(prefix: &str, index: usize, locator: String) -> Finding {
    Finding::warning(
        Phase::Sequence,
        "Q007",
        format!(
            "Nested sequence at processor {} in '{}' has no processors",
            index, prefix
        ),
        Some(locator),
    )
}
