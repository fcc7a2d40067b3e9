//! CLI functionality for the ADQL tool
//!
//! This module contains the command implementations:
//! - Parsing and normalising a query
//! - Validating query files
//! - Fixing identifier mistakes
//! - Listing the configured language features

pub mod features;
pub mod fix;
pub mod output;
pub mod parse;
pub mod validate;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;

/// Where a single query is read from
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub query: Option<String>,
    pub file: Option<PathBuf>,
}

impl Input {
    /// Query text from the argument, else the file, else stdin
    pub fn read(&self) -> Result<String> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }
        if let Some(file) = &self.file {
            return std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read query file: {}", file.display()));
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read query from stdin")?;
        Ok(text)
    }
}
