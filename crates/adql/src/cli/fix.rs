//! Fix command implementation

use super::Input;
use super::output::{self, OutputFormat};
use crate::ParserConfig;
use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

/// Configuration for fix command
pub struct FixConfig {
    pub input: Input,
    pub format: OutputFormat,
    /// Also parse the fixed query and report what still fails
    pub verify: bool,
}

#[derive(Debug, Serialize)]
struct FixReport<'a> {
    original: &'a str,
    fixed: &'a str,
    changed: bool,
}

/// Quote the identifiers the parser would reject and print the result
pub fn fix(settings: &ParserConfig, config: FixConfig) -> Result<ExitCode> {
    let text = config.input.read()?;
    let parser = settings.build()?;

    let fixed = match parser.fix_query(&text) {
        Ok(fixed) => fixed,
        Err(e) => {
            eprintln!("{}", output::format_diagnostics(&e.diagnostics(), &text));
            return Ok(ExitCode::FAILURE);
        }
    };

    match config.format {
        OutputFormat::Json => {
            let report = FixReport {
                original: &text,
                fixed: &fixed,
                changed: fixed != text,
            };
            println!("{}", output::format_json(&report)?);
        }
        OutputFormat::Text => println!("{fixed}"),
    }

    if config.verify {
        if let Err(e) = parser.parse_query(&fixed) {
            eprintln!(
                "{}",
                output::format_warning("the fixed query still does not parse")
            );
            eprintln!("{}", output::format_diagnostics(&e.diagnostics(), &fixed));
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}
