//! ADQL parser
//!
//! This crate turns ADQL text into an [`adql_ast::Ast`]. It provides the
//! tokenizer, a recursive-descent parser for the ADQL 2.0 and 2.1 grammars
//! and the [`QueryFixer`], a token-level repair pass for common identifier
//! mistakes.
//!
//! Optional language features are gated by the parser's
//! [`FeatureSet`]: a query using a feature that is not supported still
//! parses, but every such use is reported in one
//! [`UnresolvedError`](adql_diagnostics::UnresolvedError).
//!
//! ```
//! use adql_parser::AdqlParser;
//!
//! let ast = AdqlParser::default()
//!     .parse_query("select top 10 ra, de from basic where ra > 10")
//!     .unwrap();
//! assert_eq!(ast.to_adql(), "SELECT TOP 10 ra, de FROM basic WHERE ra > 10");
//! ```

mod condition;
mod fixer;
mod lexer;
mod operand;
mod parser;
mod query;
mod token;

pub use fixer::QueryFixer;
pub use lexer::Tokenizer;
pub use token::{Keyword, Token, TokenKind, is_regular_identifier, is_sql_reserved};

use adql_ast::{AdqlVersion, Ast, FeatureSet};
use adql_diagnostics::{LexicalError, ParseResult};
use parser::Parser;

/// Parser for one ADQL version and set of supported features
#[derive(Debug, Clone)]
pub struct AdqlParser {
    version: AdqlVersion,
    features: FeatureSet,
}

impl Default for AdqlParser {
    fn default() -> Self {
        Self::new(AdqlVersion::default())
    }
}

impl AdqlParser {
    /// Parser supporting every feature of `version` and any UDF
    pub fn new(version: AdqlVersion) -> Self {
        Self {
            version,
            features: FeatureSet::for_version(version),
        }
    }

    pub fn with_features(version: AdqlVersion, features: FeatureSet) -> Self {
        Self { version, features }
    }

    pub fn version(&self) -> AdqlVersion {
        self.version
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureSet {
        &mut self.features
    }

    /// Parse a whole query
    pub fn parse_query(&self, text: &str) -> ParseResult<Ast> {
        log::debug!("parsing ADQL {} query ({} bytes)", self.version, text.len());
        self.parser(text).run(|p| p.query_expression())
    }

    /// Parse a `SELECT ...` clause on its own
    pub fn parse_select(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.select_clause())
    }

    /// Parse a `FROM ...` clause on its own
    pub fn parse_from(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.from_clause())
    }

    pub fn parse_where(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.where_clause())
    }

    pub fn parse_group_by(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.group_by_clause())
    }

    pub fn parse_having(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.having_clause())
    }

    pub fn parse_order_by(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.order_by_clause())
    }

    /// Parse a single value expression
    pub fn parse_operand(&self, text: &str) -> ParseResult<Ast> {
        self.parser(text).run(|p| p.operand())
    }

    /// Tokens of `text` in this parser's version, ending with `Eof`
    pub fn tokenize<'s>(&self, text: &'s str) -> Result<Vec<Token<'s>>, LexicalError> {
        Tokenizer::new(text, self.version).tokenize()
    }

    /// Run the [`QueryFixer`] in this parser's version
    pub fn fix_query(&self, text: &str) -> ParseResult<String> {
        QueryFixer::new(self.version).fix(text)
    }

    fn parser<'a, 's>(&'a self, text: &'s str) -> Parser<'a, 's> {
        Parser::new(text, self.version, &self.features)
    }
}

/// Parse a query with the default ADQL 2.1 parser
pub fn parse(text: &str) -> ParseResult<Ast> {
    AdqlParser::default().parse_query(text)
}
