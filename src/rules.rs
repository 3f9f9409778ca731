//! Versioned rule tables shared by every validation phase.
//!
//! The tables track what the remote deployment API accepts. They change only with an
//! explicit version bump, so the built-in set is a plain value that callers may replace
//! wholesale or extend from a TOML override file.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::RulesError;

pub const PIPELINE_VERSION: &str = "v3";
pub const SELF_TELEMETRY_INPUT: &str = "ed_self_telemetry_input";
pub const TERMINAL_PROCESSOR: &str = "deotel";
pub const NESTED_SEQUENCE: &str = "sequence";

/// Processor types accepted inside a sequence node.
pub const SEQUENCE_COMPATIBLE_PROCESSORS: [&str; 23] = [
    "generic_mask",
    "extract_metric",
    "ottl_transform",
    "sample",
    "dedup",
    "log_to_pattern_metric",
    "delete_empty_values",
    "json_unroll",
    "log_to_metric",
    "log_to_signal",
    "metric_to_log",
    "trace_to_log",
    "log_to_log",
    "metric_to_metric",
    "trace_to_trace",
    "attribute_filter",
    "regex_filter",
    "stateful_where",
    "deotel",
    "http_request_call",
    "sampling",
    "throttle",
    "regex_based_log_parser",
];

/// Keys the remote API is known to choke on.
pub const FORBIDDEN_KEYS: [(&str, &str); 1] = [(
    "persisting_cursor_settings",
    "causes remote API 500 errors on deploy",
)];

pub const JSON_FIELD_PATH_KEY: &str = "json_field_path";
pub const FORBIDDEN_PATH_PREFIX: char = '.';
pub const PATH_PREFIX_SUBSTITUTE: char = '$';

/// Legacy item-rooted accessors and their current spelling.
pub const DEPRECATED_PATH_PREFIXES: [(&str, &str); 3] = [
    ("item[\"attributes\"]", "attributes"),
    ("item[\"resource\"]", "resource"),
    ("item[\"body\"]", "body"),
];

/// Role a node plays in the pipeline graph, derived from its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Input,
    Output,
    Sequence,
    Compound,
    Processor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenKey {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecatedPath {
    pub prefix: String,
    pub replacement: String,
}

/// Complete rule table for one pipeline format version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub version: String,
    pub required_node_type: String,
    pub terminal_processor_type: String,
    pub compatible_processors: BTreeSet<String>,
    pub forbidden_keys: Vec<ForbiddenKey>,
    pub path_field: String,
    pub forbidden_path_prefix: char,
    pub path_prefix_substitute: char,
    pub deprecated_paths: Vec<DeprecatedPath>,
}

static DEFAULT_RULES: LazyLock<RuleSet> = LazyLock::new(RuleSet::v3);

impl RuleSet {
    /// Built-in table for the `v3` pipeline format.
    pub fn v3() -> Self {
        RuleSet {
            version: PIPELINE_VERSION.to_string(),
            required_node_type: SELF_TELEMETRY_INPUT.to_string(),
            terminal_processor_type: TERMINAL_PROCESSOR.to_string(),
            compatible_processors: SEQUENCE_COMPATIBLE_PROCESSORS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            forbidden_keys: FORBIDDEN_KEYS
                .iter()
                .map(|(key, reason)| ForbiddenKey {
                    key: key.to_string(),
                    reason: reason.to_string(),
                })
                .collect(),
            path_field: JSON_FIELD_PATH_KEY.to_string(),
            forbidden_path_prefix: FORBIDDEN_PATH_PREFIX,
            path_prefix_substitute: PATH_PREFIX_SUBSTITUTE,
            deprecated_paths: DEPRECATED_PATH_PREFIXES
                .iter()
                .map(|(prefix, replacement)| DeprecatedPath {
                    prefix: prefix.to_string(),
                    replacement: replacement.to_string(),
                })
                .collect(),
        }
    }

    /// Process-wide default, built on first use.
    pub fn default_rules() -> &'static RuleSet {
        &DEFAULT_RULES
    }

    pub fn is_compatible(&self, processor_type: &str) -> bool {
        self.compatible_processors.contains(processor_type)
    }

    pub fn is_terminal_processor(&self, step_type: &str) -> bool {
        step_type == self.terminal_processor_type
    }

    /// Role from the node type alone. Compound nodes are recognised by the caller,
    /// which can see the node's steps.
    pub fn role_of(&self, node_type: &str) -> NodeRole {
        if node_type.ends_with("_input") {
            NodeRole::Input
        } else if node_type.ends_with("_output") {
            NodeRole::Output
        } else if node_type == NESTED_SEQUENCE {
            NodeRole::Sequence
        } else {
            NodeRole::Processor
        }
    }

    /// Apply a TOML override document on top of this table.
    pub fn with_overrides_str(mut self, toml_text: &str) -> Result<Self, RulesError> {
        let overrides: RulesOverride = toml::from_str(toml_text)?;
        overrides.apply(&mut self)?;
        Ok(self)
    }

    /// Built-in table extended by the override file at `path`.
    pub fn load_overrides(path: &Path) -> Result<Self, RulesError> {
        let text = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading rule overrides");
        RuleSet::v3().with_overrides_str(&text)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::v3()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesOverride {
    version: Option<String>,
    required_node_type: Option<String>,
    terminal_processor_type: Option<String>,
    #[serde(default)]
    extra_processors: Vec<String>,
    #[serde(default)]
    forbidden_keys: Vec<ForbiddenKeyOverride>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForbiddenKeyOverride {
    key: String,
    reason: String,
}

impl RulesOverride {
    fn apply(self, rules: &mut RuleSet) -> Result<(), RulesError> {
        if let Some(version) = self.version {
            rules.version = non_empty("version", version)?;
        }
        if let Some(required) = self.required_node_type {
            rules.required_node_type = non_empty("required_node_type", required)?;
        }
        if let Some(terminal) = self.terminal_processor_type {
            rules.terminal_processor_type = non_empty("terminal_processor_type", terminal)?;
        }
        for processor in self.extra_processors {
            let processor = non_empty("extra_processors", processor)?;
            if processor == NESTED_SEQUENCE {
                return Err(RulesError::Invalid(format!(
                    "'{}' is a nested sequence, not a processor type",
                    processor
                )));
            }
            rules.compatible_processors.insert(processor);
        }
        for entry in self.forbidden_keys {
            rules.forbidden_keys.push(ForbiddenKey {
                key: non_empty("forbidden_keys.key", entry.key)?,
                reason: entry.reason,
            });
        }
        Ok(())
    }
}

fn non_empty(field: &str, value: String) -> Result<String, RulesError> {
    if value.trim().is_empty() {
        Err(RulesError::Invalid(format!("'{}' must not be empty", field)))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v3_whitelist_has_23_entries() {
        let rules = RuleSet::v3();
        assert_eq!(rules.compatible_processors.len(), 23);
        assert!(rules.is_compatible("deotel"));
        assert!(!rules.is_compatible("sequence"));
        assert!(!rules.is_compatible("lookup"));
    }

    #[test]
    fn overrides_extend_whitelist() {
        let rules = RuleSet::v3()
            .with_overrides_str("extra_processors = [\"lookup\", \"route\"]\n")
            .unwrap();
        assert!(rules.is_compatible("lookup"));
        assert!(rules.is_compatible("route"));
        assert_eq!(rules.compatible_processors.len(), 25);
    }

    #[test]
    fn overrides_reject_unknown_keys() {
        let err = RuleSet::v3().with_overrides_str("colour = \"red\"\n").unwrap_err();
        assert!(matches!(err, RulesError::Toml(_)));
    }

    #[test]
    fn overrides_reject_sequence_as_processor() {
        let err = RuleSet::v3()
            .with_overrides_str("extra_processors = [\"sequence\"]\n")
            .unwrap_err();
        assert!(matches!(err, RulesError::Invalid(_)));
    }

    #[test]
    fn roles_follow_type_suffix() {
        let rules = RuleSet::v3();
        assert_eq!(rules.role_of("file_input"), NodeRole::Input);
        assert_eq!(rules.role_of("ed_self_telemetry_input"), NodeRole::Input);
        assert_eq!(rules.role_of("ed_output"), NodeRole::Output);
        assert_eq!(rules.role_of("sequence"), NodeRole::Sequence);
        assert_eq!(rules.role_of("mask"), NodeRole::Processor);
    }
}
