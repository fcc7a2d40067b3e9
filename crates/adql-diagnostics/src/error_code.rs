//! ADQL error codes following a structured numbering system
//!
//! Error code ranges:
//! - ADQL0001-ADQL0099: Lexical and syntax errors
//! - ADQL0100-ADQL0199: Unsupported features and semantic (schema) errors
//! - ADQL0200-ADQL0299: Tree mutation and copy errors
//! - ADQL0300-ADQL0399: Configuration errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Lexical or syntax error (0001-0099)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Unsupported feature or schema resolution error (0100-0199)
    pub const fn is_semantic_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Tree mutation or copy error (0200-0299)
    pub const fn is_tree_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Configuration error (0300-0399)
    pub const fn is_config_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Lexical and syntax errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of query"));
    map.insert(3, ErrorInfo::new("Unknown character"));
    map.insert(4, ErrorInfo::new("Unterminated string literal"));
    map.insert(5, ErrorInfo::new("Unterminated delimited identifier"));
    map.insert(6, ErrorInfo::new("Empty delimited identifier"));
    map.insert(7, ErrorInfo::new("Invalid number format"));
    map.insert(
        8,
        ErrorInfo::new("Reserved word used as identifier")
            .with_help("Write the identifier between double quotes"),
    );
    map.insert(
        9,
        ErrorInfo::new("Invalid regular identifier")
            .with_help("Write the identifier between double quotes"),
    );
    map.insert(10, ErrorInfo::new("Qualified name not allowed here"));
    map.insert(11, ErrorInfo::new("Incorrect number of arguments"));
    map.insert(12, ErrorInfo::new("Incorrect argument type"));
    map.insert(13, ErrorInfo::new("Unsigned integer expected"));
    map.insert(14, ErrorInfo::new("Missing subquery alias"));

    // Unsupported features and semantic errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("Unsupported language feature")
            .with_help("Enable the feature in the parser configuration"),
    );
    map.insert(
        101,
        ErrorInfo::new("Undeclared user-defined function")
            .with_help("Declare the function or allow any user-defined function"),
    );
    map.insert(102, ErrorInfo::new("Unknown table"));
    map.insert(103, ErrorInfo::new("Unknown column"));
    map.insert(104, ErrorInfo::new("Ambiguous column reference"));
    map.insert(105, ErrorInfo::new("Ambiguous table reference"));
    map.insert(106, ErrorInfo::new("Incompatible column type"));
    map.insert(
        107,
        ErrorInfo::new("Column list length mismatch")
            .with_help("Name as many columns as the query returns"),
    );

    // Tree mutation and copy errors (0200-0299)
    map.insert(200, ErrorInfo::new("Illegal cursor state"));
    map.insert(201, ErrorInfo::new("Replacement type mismatch"));
    map.insert(202, ErrorInfo::new("Removal from fixed-arity node"));
    map.insert(203, ErrorInfo::new("Minimum number of children reached"));
    map.insert(204, ErrorInfo::new("Unknown node"));
    map.insert(205, ErrorInfo::new("Copy failed"));

    // Configuration errors (0300-0399)
    map.insert(300, ErrorInfo::new("Invalid configuration"));
    map.insert(301, ErrorInfo::new("Invalid function signature"));
    map.insert(302, ErrorInfo::new("Unknown language feature"));
    map.insert(303, ErrorInfo::new("Unknown ADQL version"));

    map
});

// Lexical and syntax errors
pub const ADQL0001: ErrorCode = ErrorCode::new(1);
pub const ADQL0002: ErrorCode = ErrorCode::new(2);
pub const ADQL0003: ErrorCode = ErrorCode::new(3);
pub const ADQL0004: ErrorCode = ErrorCode::new(4);
pub const ADQL0005: ErrorCode = ErrorCode::new(5);
pub const ADQL0006: ErrorCode = ErrorCode::new(6);
pub const ADQL0007: ErrorCode = ErrorCode::new(7);
pub const ADQL0008: ErrorCode = ErrorCode::new(8);
pub const ADQL0009: ErrorCode = ErrorCode::new(9);
pub const ADQL0010: ErrorCode = ErrorCode::new(10);
pub const ADQL0011: ErrorCode = ErrorCode::new(11);
pub const ADQL0012: ErrorCode = ErrorCode::new(12);
pub const ADQL0013: ErrorCode = ErrorCode::new(13);
pub const ADQL0014: ErrorCode = ErrorCode::new(14);

// Unsupported features and semantic errors
pub const ADQL0100: ErrorCode = ErrorCode::new(100);
pub const ADQL0101: ErrorCode = ErrorCode::new(101);
pub const ADQL0102: ErrorCode = ErrorCode::new(102);
pub const ADQL0103: ErrorCode = ErrorCode::new(103);
pub const ADQL0104: ErrorCode = ErrorCode::new(104);
pub const ADQL0105: ErrorCode = ErrorCode::new(105);
pub const ADQL0106: ErrorCode = ErrorCode::new(106);
pub const ADQL0107: ErrorCode = ErrorCode::new(107);

// Tree mutation and copy errors
pub const ADQL0200: ErrorCode = ErrorCode::new(200);
pub const ADQL0201: ErrorCode = ErrorCode::new(201);
pub const ADQL0202: ErrorCode = ErrorCode::new(202);
pub const ADQL0203: ErrorCode = ErrorCode::new(203);
pub const ADQL0204: ErrorCode = ErrorCode::new(204);
pub const ADQL0205: ErrorCode = ErrorCode::new(205);

// Configuration errors
pub const ADQL0300: ErrorCode = ErrorCode::new(300);
pub const ADQL0301: ErrorCode = ErrorCode::new(301);
pub const ADQL0302: ErrorCode = ErrorCode::new(302);
pub const ADQL0303: ErrorCode = ErrorCode::new(303);
