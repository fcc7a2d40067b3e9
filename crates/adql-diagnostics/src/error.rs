//! ADQL error types
//!
//! Parsing fails in one of three distinct ways: a lexical error or a syntax
//! error stop the parse at the first problem, while unsupported features are
//! collected over the whole query and reported together.

use crate::{ADQL0002, ErrorCode, TextPosition};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with location and context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub location: Option<TextPosition>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
            help: code.info().help.map(str::to_string),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn with_location(mut self, location: Option<TextPosition>) -> Self {
        self.location = location;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic with the offending source line underlined.
    pub fn render(&self, source: &str) -> String {
        let mut out = self.headline();
        let Some(location) = self.location else {
            return out;
        };
        if let Some(line) = source.lines().nth(location.begin_line.saturating_sub(1) as usize) {
            let start = location.begin_column.saturating_sub(1) as usize;
            let width = if location.end_line == location.begin_line {
                location.end_column.saturating_sub(location.begin_column).max(1) as usize
            } else {
                line.chars().count().saturating_sub(start).max(1)
            };
            out.push_str(&format!(
                "\n  {:>4} | {}\n       | {}{}",
                location.begin_line,
                line,
                " ".repeat(start),
                "^".repeat(width)
            ));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  help: {help}"));
        }
        out
    }

    #[cfg(feature = "colored")]
    fn headline(&self) -> String {
        use colored::Colorize;
        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
            Severity::Info => self.severity.to_string().blue().bold(),
        };
        format!("{severity}[{}]: {}", self.code, self.message)
    }

    #[cfg(not(feature = "colored"))]
    fn headline(&self) -> String {
        format!("{}[{}]: {}", self.severity, self.code, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Malformed token or unknown character
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({position})")]
pub struct LexicalError {
    pub code: ErrorCode,
    pub message: String,
    /// The offending character, if the error is about a single character
    pub character: Option<char>,
    pub position: TextPosition,
}

impl LexicalError {
    pub fn new(code: ErrorCode, message: impl Into<String>, position: TextPosition) -> Self {
        Self {
            code,
            message: message.into(),
            character: None,
            position,
        }
    }

    pub fn with_character(mut self, character: char) -> Self {
        self.character = Some(character);
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone()).with_location(Some(self.position))
    }
}

/// Token sequence matching no grammar production
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({position})")]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub message: String,
    /// Image of the offending token; `None` at the end of the query
    pub found: Option<String>,
    /// Alternatives the grammar would have accepted
    pub expected: Vec<String>,
    pub position: TextPosition,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, message: impl Into<String>, position: TextPosition) -> Self {
        Self {
            code,
            message: message.into(),
            found: None,
            expected: Vec::new(),
            position,
        }
    }

    /// "Encountered X. Was expecting one of: ..." error at a token
    pub fn unexpected(found: Option<&str>, expected: &[&str], position: TextPosition) -> Self {
        let message = match found {
            Some(image) => format!("Encountered \"{image}\"."),
            None => "Unexpected end of query.".to_string(),
        };
        let message = match expected {
            [] => message,
            [one] => format!("{message} Was expecting: {one}"),
            many => format!("{message} Was expecting one of: {}", many.join(", ")),
        };
        Self {
            code: if found.is_some() { crate::ADQL0001 } else { ADQL0002 },
            message,
            found: found.map(str::to_string),
            expected: expected.iter().map(|e| e.to_string()).collect(),
            position,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone()).with_location(Some(self.position))
    }
}

/// One error of an aggregated report
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct PositionedError {
    pub code: ErrorCode,
    pub message: String,
    pub position: Option<TextPosition>,
}

impl PositionedError {
    pub fn new(code: ErrorCode, message: impl Into<String>, position: Option<TextPosition>) -> Self {
        Self {
            code,
            message: message.into(),
            position,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code, self.message.clone()).with_location(self.position)
    }
}

/// Every unsupported construct of a syntactically valid query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} unsupported ADQL feature(s): {}", .errors.len(), join_messages(.errors))]
pub struct UnresolvedError {
    pub errors: Vec<PositionedError>,
}

impl UnresolvedError {
    pub fn new(errors: Vec<PositionedError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PositionedError> {
        self.errors.iter()
    }
}

/// Error returned by the parser entry points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedError),
}

impl ParseError {
    /// Position of the first reported problem
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            Self::Lexical(e) => Some(e.position),
            Self::Syntax(e) => Some(e.position),
            Self::Unresolved(e) => e.errors.first().and_then(|e| e.position),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lexical(e) => e.code,
            Self::Syntax(e) => e.code,
            Self::Unresolved(e) => e
                .errors
                .first()
                .map(|e| e.code)
                .unwrap_or(crate::ADQL0100),
        }
    }

    /// One diagnostic per reported problem
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Lexical(e) => vec![e.to_diagnostic()],
            Self::Syntax(e) => vec![e.to_diagnostic()],
            Self::Unresolved(e) => e.errors.iter().map(PositionedError::to_diagnostic).collect(),
        }
    }
}

/// Schema resolution problems found by a query checker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} unresolved identifier(s): {}", .errors.len(), join_messages(.errors))]
pub struct CheckError {
    pub errors: Vec<PositionedError>,
}

impl CheckError {
    pub fn new(errors: Vec<PositionedError>) -> Self {
        Self { errors }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(PositionedError::to_diagnostic).collect()
    }
}

fn join_messages(errors: &[PositionedError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
