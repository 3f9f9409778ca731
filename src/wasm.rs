//! WASM entry points for browser-based pipeline editors.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::LoadError;
use crate::parse::types::Node;
use crate::report::{Finding, Report};
use crate::rules::RuleSet;

/// Validate pipeline YAML: load + every validation phase.
/// Returns `{ status: "report", ... }` or `{ status: "load_error", ... }`.
#[wasm_bindgen]
pub fn validate_pipeline(yaml: &str) -> JsValue {
    let result = validate_pipeline_inner(yaml);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_pipeline_inner(yaml: &str) -> ValidateResult {
    match crate::validate::validate_str(yaml) {
        Ok(report) => ValidateResult::Report(report),
        Err(err) => ValidateResult::LoadError(LoadErrorDto::from(&err)),
    }
}

/// Check a single node's processor sequence while it is being edited.
/// Returns a JSON array of findings.
#[wasm_bindgen]
pub fn validate_node(node_yaml: &str) -> JsValue {
    let result = validate_node_inner(node_yaml);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_node_inner(node_yaml: &str) -> Result<Vec<Finding>, LoadErrorDto> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(node_yaml).map_err(|e| LoadErrorDto::from(&LoadError::from(e)))?;
    if !value.is_mapping() {
        let err = LoadError::NotAMapping {
            found: crate::parse::types::kind_of(&value),
        };
        return Err(LoadErrorDto::from(&err));
    }

    let node = Node::from_value(0, &value);
    let mut findings = Vec::new();
    let rules = RuleSet::default_rules();
    crate::validate::sequence::validate_node_sequence(&node, rules, &mut findings);
    Ok(findings)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct LoadErrorDto {
    code: String,
    message: String,
}

impl From<&LoadError> for LoadErrorDto {
    fn from(e: &LoadError) -> Self {
        LoadErrorDto {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status")]
enum ValidateResult {
    #[serde(rename = "report")]
    Report(Report),
    #[serde(rename = "load_error")]
    LoadError(LoadErrorDto),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_is_tagged() {
        let result = validate_pipeline_inner("nodes: [unclosed");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "load_error");
        assert_eq!(json["code"], "P001");
    }

    #[test]
    fn report_is_tagged() {
        let result = validate_pipeline_inner("version: v3\n");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "report");
        assert_eq!(json["valid"], false);
    }

    #[test]
    fn single_node_sequence_findings() {
        let yaml = r#"
name: mask
type: sequence
processors:
  - type: deotel
  - type: generic_mask
    final: true
"#;
        let findings = validate_node_inner(yaml).unwrap();
        assert!(findings.iter().any(|f| f.code == "Q004"));
    }

    #[test]
    fn single_node_must_be_mapping() {
        let err = validate_node_inner("- a\n- b\n").unwrap_err();
        assert_eq!(err.code, "P002");
    }
}
