//! Lenient typed view over a loaded pipeline document.
//!
//! Every field is optional here. Missing or mistyped values are kept as-is so the
//! validators can report each defect instead of the loader failing on the first one.

use serde_yaml::{Mapping, Value};

use crate::error::LoadError;
use crate::rules::{NESTED_SEQUENCE, NodeRole, RuleSet};

// =============================================================================
// SECTIONS
// =============================================================================

/// A list-valued key: absent, present with the wrong shape, or a list of entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Missing,
    Invalid { found: &'static str },
    Present(Vec<T>),
}

impl<T> Section<T> {
    /// Entries when the section is a well-formed list, empty otherwise.
    pub fn entries(&self) -> &[T] {
        match self {
            Section::Present(items) => items,
            _ => &[],
        }
    }

    fn from_value(value: Option<&Value>, entry: impl Fn(usize, &Value) -> T) -> Self {
        match value {
            None => Section::Missing,
            Some(Value::Sequence(items)) => Section::Present(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| entry(index, item))
                    .collect(),
            ),
            Some(other) => Section::Invalid {
                found: kind_of(other),
            },
        }
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub version: Option<Value>,
    pub settings: Option<Value>,
    pub nodes: Section<Node>,
    pub links: Section<Link>,
    /// The whole tree as loaded, for checks that look at raw values.
    pub raw: Value,
    /// Original text, when the document came from text. Comments only survive here.
    pub source: Option<String>,
}

impl Document {
    /// Build a document from an already-parsed tree.
    pub fn from_value(raw: Value, source: Option<String>) -> Result<Self, LoadError> {
        let root = match &raw {
            Value::Mapping(map) => map,
            Value::Null => return Err(LoadError::Empty),
            other => {
                return Err(LoadError::NotAMapping {
                    found: kind_of(other),
                });
            }
        };

        let nodes = Section::from_value(root.get("nodes"), Node::from_value);
        let links = Section::from_value(root.get("links"), Link::from_value);

        Ok(Document {
            version: root.get("version").cloned(),
            settings: root.get("settings").cloned(),
            nodes,
            links,
            raw,
            source,
        })
    }

    /// `settings.tag` when it is a non-blank string.
    pub fn tag(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| s.get("tag"))
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Position in the `nodes` list.
    pub index: usize,
    pub name: Option<String>,
    pub node_type: Option<String>,
    pub processors: Section<Step>,
    /// Every key on the node, including the ones above.
    pub params: Mapping,
    /// Set when the entry was not a mapping; holds the kind that was found.
    pub malformed: Option<&'static str>,
}

impl Node {
    pub(crate) fn from_value(index: usize, value: &Value) -> Self {
        let Value::Mapping(map) = value else {
            return Node {
                index,
                name: None,
                node_type: None,
                processors: Section::Missing,
                params: Mapping::new(),
                malformed: Some(kind_of(value)),
            };
        };

        Node {
            index,
            name: map.get("name").and_then(scalar_string),
            node_type: map.get("type").and_then(scalar_string),
            processors: Section::from_value(map.get("processors"), Step::from_value),
            params: map.clone(),
            malformed: None,
        }
    }

    /// Non-blank name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Non-blank type, if any.
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Name for messages: the node name, or its list position.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("nodes[{}]", self.index),
        }
    }

    /// True when any of the node's steps is itself a sequence.
    pub fn has_nested_sequence(&self) -> bool {
        self.processors
            .entries()
            .iter()
            .any(|s| matches!(s, Step::Nested { .. }))
    }

    /// Graph role; `None` when the node has no usable type.
    pub fn role(&self, rules: &RuleSet) -> Option<NodeRole> {
        let role = rules.role_of(self.node_type()?);
        match role {
            NodeRole::Sequence | NodeRole::Processor if self.has_nested_sequence() => {
                Some(NodeRole::Compound)
            }
            other => Some(other),
        }
    }
}

// =============================================================================
// LINKS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub index: usize,
    pub from: Option<String>,
    pub to: Option<String>,
    pub malformed: Option<&'static str>,
}

impl Link {
    fn from_value(index: usize, value: &Value) -> Self {
        match value {
            Value::Mapping(map) => Link {
                index,
                from: map.get("from").and_then(scalar_string),
                to: map.get("to").and_then(scalar_string),
                malformed: None,
            },
            other => Link {
                index,
                from: None,
                to: None,
                malformed: Some(kind_of(other)),
            },
        }
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref().filter(|n| !n.trim().is_empty())
    }
}

// =============================================================================
// STEPS
// =============================================================================

/// One entry of a node's `processors` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Leaf {
        index: usize,
        step_type: Option<String>,
        is_final: bool,
        params: Mapping,
    },
    Nested {
        index: usize,
        is_final: bool,
        steps: Section<Step>,
        params: Mapping,
    },
    Malformed {
        index: usize,
        found: &'static str,
    },
}

impl Step {
    fn from_value(index: usize, value: &Value) -> Self {
        let Value::Mapping(map) = value else {
            return Step::Malformed {
                index,
                found: kind_of(value),
            };
        };

        let step_type = map.get("type").and_then(scalar_string);
        let is_final = map.get("final").and_then(Value::as_bool).unwrap_or(false);

        if step_type.as_deref() == Some(NESTED_SEQUENCE) {
            return Step::Nested {
                index,
                is_final,
                steps: Section::from_value(map.get("processors"), Step::from_value),
                params: map.clone(),
            };
        }

        Step::Leaf {
            index,
            step_type,
            is_final,
            params: map.clone(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Step::Leaf { index, .. }
            | Step::Nested { index, .. }
            | Step::Malformed { index, .. } => *index,
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            Step::Leaf { is_final, .. } | Step::Nested { is_final, .. } => *is_final,
            Step::Malformed { .. } => false,
        }
    }

    /// The step's declared type; nested sequences report `sequence`.
    pub fn step_type(&self) -> Option<&str> {
        match self {
            Step::Leaf { step_type, .. } => step_type.as_deref().filter(|t| !t.trim().is_empty()),
            Step::Nested { .. } => Some(NESTED_SEQUENCE),
            Step::Malformed { .. } => None,
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Human name for the shape of a YAML value.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Scalars used as names may be written unquoted, e.g. `name: 42`.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
