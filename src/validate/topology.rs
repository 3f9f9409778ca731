//! Graph-level rules over resolved links (G001–G004).

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::error::Phase;
use crate::parse::graph::PipelineGraph;
use crate::parse::types::Document;
use crate::report::Finding;
use crate::rules::{NodeRole, RuleSet};

pub fn validate_topology(
    document: &Document,
    graph: &PipelineGraph,
    rules: &RuleSet,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    g001_no_cycles(graph, &mut findings);
    g002_input_reaches_output(document, graph, rules, &mut findings);
    g003_no_isolated_nodes(graph, &mut findings);
    g004_no_duplicate_links(document, &mut findings);

    findings
}

// ---------------------------------------------------------------------------
// Cycles: depth-first search with three-colour marking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct CycleSearch<'g> {
    graph: &'g PipelineGraph,
    marks: Vec<Mark>,
    stack: Vec<NodeIndex>,
    seen: HashSet<Vec<usize>>,
    cycles: Vec<Vec<NodeIndex>>,
}

impl<'g> CycleSearch<'g> {
    fn new(graph: &'g PipelineGraph) -> Self {
        CycleSearch {
            graph,
            marks: vec![Mark::Unvisited; graph.graph.node_count()],
            stack: Vec::new(),
            seen: HashSet::new(),
            cycles: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<NodeIndex>> {
        for idx in self.graph.graph.node_indices() {
            if self.marks[idx.index()] == Mark::Unvisited {
                self.visit(idx);
            }
        }
        self.cycles
    }

    fn visit(&mut self, idx: NodeIndex) {
        self.marks[idx.index()] = Mark::InProgress;
        self.stack.push(idx);

        for next in self.graph.successor_indices(idx) {
            match self.marks[next.index()] {
                Mark::Unvisited => self.visit(next),
                Mark::InProgress => self.record_back_edge(next),
                Mark::Done => {}
            }
        }

        self.stack.pop();
        self.marks[idx.index()] = Mark::Done;
    }

    /// The path from `target` to the top of the stack closes a cycle.
    fn record_back_edge(&mut self, target: NodeIndex) {
        let Some(start) = self.stack.iter().position(|&n| n == target) else {
            return;
        };
        let cycle = self.stack[start..].to_vec();
        if self.seen.insert(canonical(&cycle)) {
            self.cycles.push(cycle);
        }
    }
}

/// Rotation-independent key so the same cycle found twice is reported once.
fn canonical(cycle: &[NodeIndex]) -> Vec<usize> {
    let raw: Vec<usize> = cycle.iter().map(|n| n.index()).collect();
    let pivot = raw
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| **v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    raw[pivot..].iter().chain(raw[..pivot].iter()).copied().collect()
}

fn g001_no_cycles(graph: &PipelineGraph, findings: &mut Vec<Finding>) {
    for cycle in CycleSearch::new(graph).run() {
        let names: Vec<&str> = cycle.iter().map(|&n| graph.graph[n].as_str()).collect();
        let path = names
            .iter()
            .chain(names.first())
            .copied()
            .collect::<Vec<_>>()
            .join(" -> ");
        findings.push(
            Finding::error(
                Phase::Graph,
                "G001",
                format!("Cycle detected: {}", path),
                names.first().map(|n| n.to_string()),
            )
            .with_suggestion("remove one of the links in the cycle"),
        );
    }
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

/// Unreachable outputs silently drop data, so this is an error.
fn g002_input_reaches_output(
    document: &Document,
    graph: &PipelineGraph,
    rules: &RuleSet,
    findings: &mut Vec<Finding>,
) {
    // A lone node has nothing to link to.
    if graph.graph.node_count() < 2 {
        return;
    }

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut classified = HashSet::new();
    for node in document.nodes.entries() {
        let (Some(name), Some(role)) = (node.name(), node.role(rules)) else {
            continue;
        };
        if !classified.insert(name) {
            continue;
        }
        match role {
            NodeRole::Input => inputs.push(name),
            NodeRole::Output => outputs.push(name),
            NodeRole::Sequence | NodeRole::Compound | NodeRole::Processor => {}
        }
    }

    let message = if inputs.is_empty() {
        "No path from input to output: pipeline has no input node".to_string()
    } else if outputs.is_empty() {
        "No path from input to output: pipeline has no output node".to_string()
    } else if inputs
        .iter()
        .any(|i| outputs.iter().any(|o| graph.has_path(i, o)))
    {
        return;
    } else {
        format!(
            "No path from input to output: none of [{}] reaches any of [{}]",
            inputs.join(", "),
            outputs.join(", ")
        )
    };

    findings.push(
        Finding::error(Phase::Graph, "G002", message, None)
            .with_suggestion("link at least one input node through to an output node"),
    );
}

fn g003_no_isolated_nodes(graph: &PipelineGraph, findings: &mut Vec<Finding>) {
    if graph.graph.node_count() < 2 {
        return;
    }
    for name in graph.names() {
        if graph.incoming_count(name) == 0 && graph.outgoing_count(name) == 0 {
            findings.push(Finding::warning(
                Phase::Graph,
                "G003",
                format!("Node '{}' has no links", name),
                Some(name.to_string()),
            ));
        }
    }
}

fn g004_no_duplicate_links(document: &Document, findings: &mut Vec<Finding>) {
    let mut seen = HashSet::new();
    for link in document.links.entries() {
        let (Some(from), Some(to)) = (link.from(), link.to()) else {
            continue;
        };
        if !seen.insert((from, to)) {
            findings.push(Finding::warning(
                Phase::Graph,
                "G004",
                format!("Duplicate link from '{}' to '{}'", from, to),
                Some(format!("links[{}]", link.index)),
            ));
        }
    }
}
