//! Token-level repair of queries that trip over common identifier mistakes
//!
//! The fixer never builds a tree. It normalises the text, tokenizes it and
//! puts double quotes around every token that would otherwise be rejected as
//! an identifier: SQL reserved words, invalid regular identifiers and
//! function names not followed by `(`. Everything between tokens is copied
//! verbatim, so fixing already fixed text changes nothing.

use crate::lexer::Tokenizer;
use crate::token::{Keyword, Token, TokenKind, is_regular_identifier};
use adql_ast::AdqlVersion;
use adql_diagnostics::ParseResult;
use regex::Regex;
use std::sync::LazyLock;

/// Unicode look-alikes and their ASCII replacement
static CONFUSABLES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"[\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}]", "-"),
        (r"[\x{2017}\x{FE4D}-\x{FE4F}\x{FF3F}]", "_"),
        (r"[\x{00A0}\x{1680}\x{2000}-\x{200A}\x{202F}\x{205F}\x{3000}]", " "),
        (r"[\x{200B}\x{2060}\x{FEFF}]", ""),
        (r"[\x{2018}\x{2019}\x{201A}\x{201B}\x{2032}\x{FF07}]", "'"),
        (r"[\x{201C}-\x{201F}\x{2033}\x{FF02}]", "\""),
        (r"[\x{FF08}\x{FE59}]", "("),
        (r"[\x{FF09}\x{FE5A}]", ")"),
        (r"[\x{FF0C}\x{FE50}]", ","),
        (r"[\x{FF0E}]", "."),
        (r"[\x{FF0A}\x{2217}]", "*"),
        (r"[\x{FF0B}]", "+"),
        (r"[\x{FF0F}\x{2215}]", "/"),
        (r"[\x{FF1D}]", "="),
        (r"[\x{FF1C}]", "<"),
        (r"[\x{FF1E}]", ">"),
        (r"[\x{FF1B}]", ";"),
    ]
    .into_iter()
    .map(|(pattern, ascii)| (Regex::new(pattern).expect("valid confusable regex"), ascii))
    .collect()
});

#[derive(Debug, Clone, Copy)]
pub struct QueryFixer {
    version: AdqlVersion,
}

impl Default for QueryFixer {
    fn default() -> Self {
        Self::new(AdqlVersion::default())
    }
}

impl QueryFixer {
    pub fn new(version: AdqlVersion) -> Self {
        Self { version }
    }

    /// Fix `query`. A lexical error aborts the whole fix.
    pub fn fix(&self, query: &str) -> ParseResult<String> {
        let text = normalize_layout(&replace_confusables(query));
        let tokens = Tokenizer::new(&text, self.version).tokenize()?;

        let mut fixed = String::with_capacity(text.len() + 16);
        let mut copied = 0;
        let mut quoted = 0usize;
        let mut casts = CastTracker::default();
        for (i, token) in tokens.iter().enumerate() {
            let in_cast_type = casts.step(token);
            if in_cast_type || !needs_quotes(token, tokens.get(i + 1)) {
                continue;
            }
            fixed.push_str(&text[copied..token.span.start]);
            fixed.push('"');
            fixed.push_str(&token.image.replace('"', "\"\""));
            fixed.push('"');
            copied = token.span.end;
            quoted += 1;
        }
        fixed.push_str(&text[copied..]);
        log::debug!("query fixer quoted {quoted} token(s)");
        Ok(fixed)
    }
}

fn replace_confusables(text: &str) -> String {
    CONFUSABLES
        .iter()
        .fold(text.to_string(), |text, (pattern, ascii)| {
            pattern.replace_all(&text, *ascii).into_owned()
        })
}

/// `\r\n` and `\r` become `\n`; a tab becomes four spaces
fn normalize_layout(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "    ")
}

fn needs_quotes(token: &Token<'_>, next: Option<&Token<'_>>) -> bool {
    match token.kind {
        TokenKind::SqlReserved => true,
        TokenKind::Identifier => !is_regular_identifier(token.image),
        TokenKind::Keyword(keyword) if keyword.is_function() => {
            next.is_none_or(|next| next.kind != TokenKind::LeftParen)
        }
        _ => false,
    }
}

/// Recognises the type name of `CAST(x AS type)`, whose words are reserved
#[derive(Debug, Default)]
struct CastTracker {
    /// One entry per open parenthesis: whether it opened a CAST
    parens: Vec<bool>,
    after_cast: bool,
    in_type: bool,
}

impl CastTracker {
    /// Advance over `token`; true when it belongs to a cast type name
    fn step(&mut self, token: &Token<'_>) -> bool {
        let after_cast = std::mem::take(&mut self.after_cast);
        match token.kind {
            TokenKind::Keyword(Keyword::Cast) => {
                self.after_cast = true;
                false
            }
            TokenKind::LeftParen => {
                self.parens.push(after_cast);
                self.in_type = false;
                false
            }
            TokenKind::RightParen => {
                self.parens.pop();
                self.in_type = false;
                false
            }
            TokenKind::Keyword(Keyword::As) if self.parens.last() == Some(&true) => {
                self.in_type = true;
                false
            }
            TokenKind::SqlReserved | TokenKind::Identifier => self.in_type,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fix(query: &str) -> String {
        QueryFixer::default().fix(query).unwrap()
    }

    #[test]
    fn test_quotes_invalid_identifier() {
        assert_eq!(fix("SELECT _bar FROM aTable"), "SELECT \"_bar\" FROM aTable");
    }

    #[test]
    fn test_quotes_reserved_words() {
        assert_eq!(
            fix("SELECT date, year, user FROM public.aTable"),
            "SELECT \"date\", \"year\", \"user\" FROM \"public\".aTable"
        );
    }

    #[test]
    fn test_confusable_underscore() {
        assert_eq!(fix("SELECT \u{FF3F}bar FROM aTable"), "SELECT \"_bar\" FROM aTable");
    }

    #[test]
    fn test_function_name_without_call() {
        assert_eq!(
            fix("SELECT point, POINT(1, 2) FROM t"),
            "SELECT \"point\", POINT(1, 2) FROM t"
        );
    }

    #[test]
    fn test_layout_normalisation() {
        assert_eq!(fix("SELECT\ta\r\nFROM t\r"), "SELECT    a\nFROM t\n");
    }

    #[test]
    fn test_cast_type_left_alone() {
        assert_eq!(
            fix("SELECT CAST(date AS DOUBLE PRECISION), CAST(x AS VARCHAR(10)) FROM t"),
            "SELECT CAST(\"date\" AS DOUBLE PRECISION), CAST(x AS VARCHAR(10)) FROM t"
        );
    }

    #[test]
    fn test_lexical_error_aborts() {
        let err = QueryFixer::default().fix("SELECT 'oops FROM t").unwrap_err();
        assert_eq!(err.code(), adql_diagnostics::ADQL0004);
    }
}
