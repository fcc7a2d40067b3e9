//! Features command implementation

use super::output::{self, OutputFormat};
use crate::ParserConfig;
use adql_ast::{FunctionDef, LanguageFeature};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FeatureListing<'a> {
    version: String,
    allow_any_udf: bool,
    supported: Vec<&'a LanguageFeature>,
    unsupported: Vec<&'a LanguageFeature>,
    udfs: Vec<&'a FunctionDef>,
}

/// Print the optional features of the configured parser
pub fn list(settings: &ParserConfig, format: OutputFormat) -> Result<()> {
    let features = settings.features()?;
    let listing = FeatureListing {
        version: settings.version.to_string(),
        allow_any_udf: features.allows_any_udf(),
        supported: features.supported(),
        unsupported: features.unsupported(),
        udfs: features.udfs().collect(),
    };

    match format {
        OutputFormat::Json => println!("{}", output::format_json(&listing)?),
        OutputFormat::Text => {
            println!("ADQL {}", listing.version);
            for feature in &listing.supported {
                println!("  {} {}", "+".green(), describe(feature));
            }
            for feature in &listing.unsupported {
                println!("  {} {}", "-".red(), describe(feature));
            }
            if !listing.udfs.is_empty() {
                println!("Declared functions:");
                for udf in &listing.udfs {
                    println!("  {udf}");
                }
            }
            let any = if listing.allow_any_udf { "allowed" } else { "rejected" };
            println!("Undeclared functions are {any}");
        }
    }
    Ok(())
}

fn describe(feature: &LanguageFeature) -> String {
    match &feature.description {
        Some(description) => format!("{feature} [{}]: {description}", feature.since),
        None => format!("{feature} [{}]", feature.since),
    }
}
