//! Validate command implementation

use super::output::{self, OutputFormat};
use super::parse::ParseReport;
use crate::{ParserConfig, QueryChecker};
use adql_diagnostics::{ADQL0300, Diagnostic};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Configuration for validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

/// Validation result for a single file
#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    source: String,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        output::count_errors(&self.diagnostics) == 0
    }
}

/// Validate ADQL files, one query per file
pub fn validate(settings: &ParserConfig, config: ValidateConfig) -> Result<ExitCode> {
    if config.files.is_empty() {
        anyhow::bail!("No files specified for validation");
    }

    let parser = settings.build()?;
    let checker = settings.checker();
    let checker = checker.as_ref().map(|c| c as &dyn QueryChecker);

    let results: Vec<FileResult> = config
        .files
        .iter()
        .map(|file| {
            if config.verbose {
                eprintln!("Validating: {}", file.display());
            }
            match std::fs::read_to_string(file) {
                Ok(source) => FileResult {
                    file: file.clone(),
                    diagnostics: ParseReport::build(&parser, checker, &source).diagnostics,
                    source,
                },
                Err(e) => FileResult {
                    file: file.clone(),
                    diagnostics: vec![Diagnostic::error(
                        ADQL0300,
                        format!("Failed to read file: {e}"),
                    )],
                    source: String::new(),
                },
            }
        })
        .collect();

    let failed = results.iter().filter(|r| !r.is_success()).count();
    match config.format {
        OutputFormat::Json => println!("{}", output::format_json(&results)?),
        OutputFormat::Text => print_summary(&results, failed),
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(results: &[FileResult], failed: usize) {
    for result in results {
        if result.is_success() {
            println!("{} {}", "✓".green(), result.file.display());
        } else {
            println!("{} {}", "✗".red(), result.file.display());
        }
        if !result.diagnostics.is_empty() {
            eprintln!("{}", output::format_diagnostics(&result.diagnostics, &result.source));
        }
    }

    println!();
    if failed == 0 {
        println!(
            "{}",
            output::format_success(&format!("All {} file(s) are valid", results.len()))
        );
    } else {
        let errors: usize = results
            .iter()
            .map(|r| output::count_errors(&r.diagnostics))
            .sum();
        eprintln!(
            "{} {} of {} file(s) with {}",
            "Validation failed:".red().bold(),
            failed,
            results.len(),
            format!("{errors} error(s)").red()
        );
    }
}
