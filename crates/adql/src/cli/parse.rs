//! Parse command implementation

use super::Input;
use super::output::{self, OutputFormat};
use crate::{AdqlParser, Error, ParserConfig, QueryChecker, parse_and_check};
use adql_ast::search::used_features;
use adql_diagnostics::Diagnostic;
use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

/// Configuration for parse command
pub struct ParseConfig {
    pub input: Input,
    pub format: OutputFormat,
    pub verbose: bool,
}

/// Outcome of parsing (and checking) one query
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    /// Normalised query, when it parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adql: Option<String>,
    /// Optional language features the query uses
    pub features: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseReport {
    pub fn build(parser: &AdqlParser, checker: Option<&dyn QueryChecker>, text: &str) -> Self {
        let result = match checker {
            Some(checker) => parse_and_check(parser, checker, text),
            None => parser.parse_query(text).map_err(Error::from),
        };
        match result {
            Ok(ast) => {
                let features = ast
                    .root()
                    .map(|root| used_features(&ast, root))
                    .unwrap_or_default()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                Self {
                    adql: Some(ast.to_adql()),
                    features,
                    diagnostics: Vec::new(),
                }
            }
            Err(e) => Self {
                adql: None,
                features: Vec::new(),
                diagnostics: e.diagnostics(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        output::count_errors(&self.diagnostics) == 0
    }
}

/// Parse a query and print it normalised
pub fn parse(settings: &ParserConfig, config: ParseConfig) -> Result<ExitCode> {
    let text = config.input.read()?;
    let parser = settings.build()?;
    let checker = settings.checker();
    let report = ParseReport::build(
        &parser,
        checker.as_ref().map(|c| c as &dyn QueryChecker),
        &text,
    );

    match config.format {
        OutputFormat::Json => println!("{}", output::format_json(&report)?),
        OutputFormat::Text => {
            if let Some(adql) = &report.adql {
                println!("{adql}");
                if config.verbose && !report.features.is_empty() {
                    eprintln!("Optional features: {}", report.features.join(", "));
                }
            }
            if !report.diagnostics.is_empty() {
                eprintln!("{}", output::format_diagnostics(&report.diagnostics, &text));
            }
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
