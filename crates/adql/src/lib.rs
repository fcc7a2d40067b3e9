//! ADQL (Astronomical Data Query Language) for Rust
//!
//! This crate gathers the ADQL toolchain:
//! - Tokenizing and parsing ADQL 2.0 and 2.1 queries into an arena tree
//! - Optional language features and user-defined functions
//! - Search and replace over query trees, and rendering back to ADQL
//! - Repair of common identifier mistakes with the query fixer
//! - Schema-aware checking against published table metadata
//!
//! # Example
//!
//! ```
//! use adql::{AdqlParser, AdqlVersion};
//!
//! let parser = AdqlParser::new(AdqlVersion::V2_1);
//! let ast = parser.parse_query("select ra, de from basic where ra between 10 and 20")?;
//! assert_eq!(ast.to_adql(), "SELECT ra, de FROM basic WHERE ra BETWEEN 10 AND 20");
//! # Ok::<(), adql::diagnostics::ParseError>(())
//! ```

pub use adql_ast as ast;
pub use adql_checker as checker;
pub use adql_diagnostics as diagnostics;
pub use adql_parser as parser;

pub use adql_ast::{AdqlVersion, Ast, FeatureSet, FunctionDef, LanguageFeature, NodeId, QueryChecker};
pub use adql_checker::DbChecker;
pub use adql_diagnostics::{CheckError, Diagnostic, ParseError};
pub use adql_parser::{AdqlParser, QueryFixer, parse};

pub mod config;
pub use config::{ConfigError, ParserConfig};

#[cfg(feature = "cli")]
pub mod cli;

use thiserror::Error;

/// Failure of [`parse_and_check`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Check(#[from] CheckError),
}

impl Error {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse(e) => e.diagnostics(),
            Error::Check(e) => e.diagnostics(),
        }
    }
}

/// Parse `text`, then hand the whole tree to `checker`
pub fn parse_and_check(
    parser: &AdqlParser,
    checker: &dyn QueryChecker,
    text: &str,
) -> Result<Ast, Error> {
    let mut ast = parser.parse_query(text)?;
    if let Some(root) = ast.root() {
        checker.check(&mut ast, root)?;
    }
    Ok(ast)
}
