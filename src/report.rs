//! Findings and the aggregated validation report.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One reported issue. Serialized output also carries its error class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FindingRecord")]
pub struct Finding {
    pub severity: Severity,
    pub phase: Phase,
    pub code: String,
    pub message: String,
    /// Node, link, step or field path the finding points at.
    pub locator: Option<String>,
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn error(
        phase: Phase,
        code: &str,
        message: impl Into<String>,
        locator: Option<String>,
    ) -> Self {
        Finding {
            severity: Severity::Error,
            phase,
            code: code.into(),
            message: message.into(),
            locator,
            suggestion: None,
        }
    }

    pub fn warning(
        phase: Phase,
        code: &str,
        message: impl Into<String>,
        locator: Option<String>,
    ) -> Self {
        Finding {
            severity: Severity::Warning,
            ..Finding::error(phase, code, message, locator)
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Error-class name, e.g. `SchemaError` or `PolicyWarning`.
    pub fn class(&self) -> String {
        let suffix = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        format!("{}{}", self.phase, suffix)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.locator {
            Some(loc) => write!(f, "[{}] {}: {}", self.code, loc, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Wire form of a `Finding`.
#[derive(Serialize)]
struct FindingRecord {
    severity: Severity,
    phase: Phase,
    class: String,
    code: String,
    message: String,
    locator: Option<String>,
    suggestion: Option<String>,
}

impl From<Finding> for FindingRecord {
    fn from(finding: Finding) -> Self {
        FindingRecord {
            class: finding.class(),
            severity: finding.severity,
            phase: finding.phase,
            code: finding.code,
            message: finding.message,
            locator: finding.locator,
            suggestion: finding.suggestion,
        }
    }
}

/// Complete outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Report {
    /// Split findings by severity, keeping their order.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Error);
        Report {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.findings().any(|f| f.code == code)
    }

    /// Errors then warnings.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary grouped by severity.
    pub fn render_human(&self, source_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Validating {}", source_name);

        for (title, findings) in [("Errors", &self.errors), ("Warnings", &self.warnings)] {
            if findings.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{} ({}):", title, findings.len());
            for finding in findings {
                let _ = writeln!(out, "  {}", finding);
                if let Some(fix) = &finding.suggestion {
                    let _ = writeln!(out, "      fix: {}", fix);
                }
            }
        }

        let _ = writeln!(
            out,
            "\n{} error(s), {} warning(s): {}",
            self.errors.len(),
            self.warnings.len(),
            if self.valid { "VALID" } else { "INVALID" }
        );
        out
    }
}
