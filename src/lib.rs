pub mod cli;
pub mod error;
pub mod logging;
pub mod parse;
pub mod report;
pub mod rules;
pub mod validate;
pub mod wasm;

pub use error::{LoadError, Phase, RulesError};
pub use parse::types::Document;
pub use report::{Finding, Report, Severity};
pub use rules::RuleSet;
pub use validate::{validate, validate_str, validate_with};

/// Crate version reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
