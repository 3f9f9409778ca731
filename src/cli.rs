//! Command-line front end: argument parsing, rendering and exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde_json::json;

use crate::error::LoadError;
use crate::parse;
use crate::report::Report;
use crate::rules::RuleSet;
use crate::validate;

pub const EXIT_VALID: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_UNLOADABLE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pipecheck")]
#[command(version = crate::VERSION)]
#[command(about = "Validate a v3 pipeline configuration before deployment")]
#[command(
    after_help = "Exit codes: 0 valid (warnings allowed), 1 invalid, 2 file could not be loaded.\n\nExample:\n    pipecheck pipeline.yaml --format json"
)]
pub struct Args {
    /// Pipeline YAML file to validate
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Log each validation phase to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// TOML file extending the built-in rule table
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

/// Run one validation and map the outcome to a process exit code.
pub fn run(args: &Args) -> ExitCode {
    let rules = match &args.rules {
        Some(path) => match RuleSet::load_overrides(path) {
            Ok(rules) => rules,
            Err(err) => {
                eprintln!("error: {}", err);
                return ExitCode::from(EXIT_UNLOADABLE);
            }
        },
        None => RuleSet::v3(),
    };

    let document = match parse::load_file(&args.path) {
        Ok(document) => document,
        Err(err) => {
            report_load_error(&err, args.format);
            return ExitCode::from(EXIT_UNLOADABLE);
        }
    };

    let report = validate::validate_with(&document, &rules);
    tracing::info!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validation finished"
    );

    match render(&report, args) {
        Ok(text) => print!("{}", text),
        Err(err) => {
            eprintln!("error: failed to render report: {}", err);
            return ExitCode::from(EXIT_UNLOADABLE);
        }
    }

    ExitCode::from(exit_code(&report))
}

pub fn exit_code(report: &Report) -> u8 {
    if report.valid {
        EXIT_VALID
    } else {
        EXIT_INVALID
    }
}

fn render(report: &Report, args: &Args) -> serde_json::Result<String> {
    match args.format {
        OutputFormat::Human => Ok(report.render_human(&args.path.display().to_string())),
        OutputFormat::Json => report.to_json().map(|mut s| {
            s.push('\n');
            s
        }),
    }
}

fn report_load_error(err: &LoadError, format: OutputFormat) {
    match format {
        OutputFormat::Human => eprintln!("error[{}]: {}", err.code(), err),
        OutputFormat::Json => println!(
            "{}",
            json!({ "load_error": { "code": err.code(), "message": err.to_string() } })
        ),
    }
}
