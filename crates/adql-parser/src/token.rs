//! Token types and the keyword tables

use adql_ast::{AdqlVersion, NumberKind};
use adql_diagnostics::{Span, TextPosition};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword(Keyword),
    /// SQL reserved word that is not an ADQL keyword
    SqlReserved,
    /// Regular identifier candidate; may still break the ADQL identifier rules
    Identifier,
    /// Identifier between double quotes
    DelimitedIdentifier,
    Number(NumberKind),
    String,

    LeftParen,
    RightParen,
    Comma,
    Dot,
    Asterisk,
    Plus,
    Minus,
    Slash,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    /// `;`
    EndOfQuery,
    Eof,
}

impl TokenKind {
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::DelimitedIdentifier)
    }

    /// Human readable form used in "was expecting" lists
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Keyword(k) => k.as_str(),
            TokenKind::SqlReserved => "<reserved word>",
            TokenKind::Identifier | TokenKind::DelimitedIdentifier => "<identifier>",
            TokenKind::Number(_) => "<number>",
            TokenKind::String => "<string>",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Asterisk => "*",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Slash => "/",
            TokenKind::Concat => "||",
            TokenKind::Equal => "=",
            TokenKind::NotEqual => "<>",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::EndOfQuery => ";",
            TokenKind::Eof => "<EOF>",
        }
    }
}

/// A lexeme of the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    /// Text as written
    pub image: &'s str,
    pub span: Span,
    pub position: TextPosition,
    /// Name of a built-in function of the active version
    pub function_name: bool,
}

impl<'s> Token<'s> {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Identifier value, with delimiting quotes removed and `""` unescaped
    pub fn identifier_value(&self) -> String {
        match self.kind {
            TokenKind::DelimitedIdentifier => {
                let inner = &self.image[1..self.image.len() - 1];
                inner.replace("\"\"", "\"")
            }
            _ => self.image.to_string(),
        }
    }

    /// String literal value, with quotes removed and `''` unescaped
    pub fn string_value(&self) -> String {
        let inner = &self.image[1..self.image.len() - 1];
        inner.replace("''", "'")
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("<EOF>"),
            _ => f.write_str(self.image),
        }
    }
}

macro_rules! keywords {
    ($($variant:ident => ($text:literal, $since:ident, $function:literal)),+ $(,)?) => {
        /// ADQL keywords with the version that introduced them
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant),+
        }

        impl Keyword {
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text),+
                }
            }

            pub fn since(&self) -> AdqlVersion {
                match self {
                    $(Keyword::$variant => AdqlVersion::$since),+
                }
            }

            /// Whether the keyword names a built-in function
            pub fn is_function(&self) -> bool {
                match self {
                    $(Keyword::$variant => $function),+
                }
            }
        }
    };
}

keywords! {
    Select => ("SELECT", V2_0, false),
    From => ("FROM", V2_0, false),
    Where => ("WHERE", V2_0, false),
    Group => ("GROUP", V2_0, false),
    By => ("BY", V2_0, false),
    Having => ("HAVING", V2_0, false),
    Order => ("ORDER", V2_0, false),
    Asc => ("ASC", V2_0, false),
    Desc => ("DESC", V2_0, false),
    Top => ("TOP", V2_0, false),
    Distinct => ("DISTINCT", V2_0, false),
    All => ("ALL", V2_0, false),
    As => ("AS", V2_0, false),
    Join => ("JOIN", V2_0, false),
    Natural => ("NATURAL", V2_0, false),
    Inner => ("INNER", V2_0, false),
    Left => ("LEFT", V2_0, false),
    Right => ("RIGHT", V2_0, false),
    Full => ("FULL", V2_0, false),
    Outer => ("OUTER", V2_0, false),
    On => ("ON", V2_0, false),
    Using => ("USING", V2_0, false),
    And => ("AND", V2_0, false),
    Or => ("OR", V2_0, false),
    Not => ("NOT", V2_0, false),
    Between => ("BETWEEN", V2_0, false),
    In => ("IN", V2_0, false),
    Like => ("LIKE", V2_0, false),
    Is => ("IS", V2_0, false),
    Null => ("NULL", V2_0, false),
    Exists => ("EXISTS", V2_0, false),
    Offset => ("OFFSET", V2_1, false),
    Union => ("UNION", V2_1, false),
    Intersect => ("INTERSECT", V2_1, false),
    Except => ("EXCEPT", V2_1, false),
    With => ("WITH", V2_1, false),
    Ilike => ("ILIKE", V2_1, false),
    Avg => ("AVG", V2_0, true),
    Max => ("MAX", V2_0, true),
    Min => ("MIN", V2_0, true),
    Sum => ("SUM", V2_0, true),
    Count => ("COUNT", V2_0, true),
    Abs => ("ABS", V2_0, true),
    Ceiling => ("CEILING", V2_0, true),
    Degrees => ("DEGREES", V2_0, true),
    Exp => ("EXP", V2_0, true),
    Floor => ("FLOOR", V2_0, true),
    Log => ("LOG", V2_0, true),
    Log10 => ("LOG10", V2_0, true),
    Mod => ("MOD", V2_0, true),
    Pi => ("PI", V2_0, true),
    Power => ("POWER", V2_0, true),
    Radians => ("RADIANS", V2_0, true),
    Rand => ("RAND", V2_0, true),
    Round => ("ROUND", V2_0, true),
    Sqrt => ("SQRT", V2_0, true),
    Truncate => ("TRUNCATE", V2_0, true),
    Acos => ("ACOS", V2_0, true),
    Asin => ("ASIN", V2_0, true),
    Atan => ("ATAN", V2_0, true),
    Atan2 => ("ATAN2", V2_0, true),
    Cos => ("COS", V2_0, true),
    Cot => ("COT", V2_0, true),
    Sin => ("SIN", V2_0, true),
    Tan => ("TAN", V2_0, true),
    Area => ("AREA", V2_0, true),
    Box => ("BOX", V2_0, true),
    Centroid => ("CENTROID", V2_0, true),
    Circle => ("CIRCLE", V2_0, true),
    Contains => ("CONTAINS", V2_0, true),
    Coord1 => ("COORD1", V2_0, true),
    Coord2 => ("COORD2", V2_0, true),
    CoordSys => ("COORDSYS", V2_0, true),
    Distance => ("DISTANCE", V2_0, true),
    Intersects => ("INTERSECTS", V2_0, true),
    Point => ("POINT", V2_0, true),
    Polygon => ("POLYGON", V2_0, true),
    Region => ("REGION", V2_0, true),
    Lower => ("LOWER", V2_1, true),
    Upper => ("UPPER", V2_1, true),
    Coalesce => ("COALESCE", V2_1, true),
    Cast => ("CAST", V2_1, true),
    InUnit => ("IN_UNIT", V2_1, true),
}

static KEYWORDS: LazyLock<std::collections::HashMap<&'static str, Keyword>> =
    LazyLock::new(|| Keyword::ALL.iter().map(|k| (k.as_str(), *k)).collect());

impl Keyword {
    /// Keyword spelled `word` (any case) in `version`
    pub fn lookup(word: &str, version: AdqlVersion) -> Option<Keyword> {
        KEYWORDS
            .get(word.to_ascii_uppercase().as_str())
            .copied()
            .filter(|k| k.since() <= version)
    }
}

/// SQL-92 reserved words that are not ADQL keywords in every version
static SQL_RESERVED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ABSOLUTE", "ACTION", "ADD", "ALLOCATE", "ALTER", "ANY", "ARE", "ASSERTION", "AT",
        "AUTHORIZATION", "BEGIN", "BIT", "BIT_LENGTH", "BOTH", "CASCADE", "CASCADED", "CASE",
        "CAST", "CATALOG", "CHAR", "CHARACTER", "CHARACTER_LENGTH", "CHAR_LENGTH", "CHECK",
        "CLOSE", "COALESCE", "COLLATE", "COLLATION", "COLUMN", "COMMIT", "CONNECT",
        "CONNECTION", "CONSTRAINT", "CONSTRAINTS", "CONTINUE", "CONVERT", "CORRESPONDING",
        "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
        "CURRENT_USER", "CURSOR", "DATE", "DAY", "DEALLOCATE", "DEC", "DECIMAL", "DECLARE",
        "DEFAULT", "DEFERRABLE", "DEFERRED", "DELETE", "DESCRIBE", "DESCRIPTOR", "DIAGNOSTICS",
        "DISCONNECT", "DOMAIN", "DOUBLE", "DROP", "ELSE", "END", "ESCAPE", "EXCEPT",
        "EXCEPTION", "EXEC", "EXECUTE", "EXTERNAL", "EXTRACT", "FALSE", "FETCH", "FIRST",
        "FLOAT", "FOR", "FOREIGN", "FOUND", "GET", "GLOBAL", "GO", "GOTO", "GRANT", "HOUR",
        "IDENTITY", "IMMEDIATE", "INDICATOR", "INITIALLY", "INPUT", "INSENSITIVE", "INSERT",
        "INT", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "ISOLATION", "KEY", "LANGUAGE",
        "LAST", "LEADING", "LEVEL", "LOCAL", "LOWER", "MATCH", "MINUTE", "MODULE", "MONTH",
        "NAMES", "NATIONAL", "NCHAR", "NEXT", "NO", "NULLIF", "NUMERIC", "OCTET_LENGTH", "OF",
        "ONLY", "OPEN", "OPTION", "OUTPUT", "OVERLAPS", "PAD", "PARTIAL", "POSITION",
        "PRECISION", "PREPARE", "PRESERVE", "PRIMARY", "PRIOR", "PRIVILEGES", "PROCEDURE",
        "PUBLIC", "READ", "REAL", "REFERENCES", "RELATIVE", "RESTRICT", "REVOKE", "ROLLBACK",
        "ROWS", "SCHEMA", "SCROLL", "SECOND", "SECTION", "SESSION", "SESSION_USER", "SET",
        "SIZE", "SMALLINT", "SOME", "SPACE", "SQL", "SQLCODE", "SQLERROR", "SQLSTATE",
        "SUBSTRING", "SYSTEM_USER", "TABLE", "TEMPORARY", "THEN", "TIME", "TIMESTAMP",
        "TIMEZONE_HOUR", "TIMEZONE_MINUTE", "TO", "TRAILING", "TRANSACTION", "TRANSLATE",
        "TRANSLATION", "TRIM", "TRUE", "UNION", "UNIQUE", "UNKNOWN", "UPDATE", "UPPER", "USAGE",
        "USER", "VALUE", "VALUES", "VARCHAR", "VARYING", "VIEW", "WHEN", "WHENEVER", "WITH",
        "WORK", "WRITE", "YEAR", "ZONE",
    ]
    .into_iter()
    .collect()
});

pub fn is_sql_reserved(word: &str) -> bool {
    SQL_RESERVED.contains(word.to_ascii_uppercase().as_str())
}

static REGULAR_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Whether `word` is a valid ADQL regular (unquoted) identifier
pub fn is_regular_identifier(word: &str) -> bool {
    REGULAR_IDENTIFIER.is_match(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_depends_on_version() {
        assert_eq!(Keyword::lookup("select", AdqlVersion::V2_0), Some(Keyword::Select));
        assert_eq!(Keyword::lookup("Lower", AdqlVersion::V2_1), Some(Keyword::Lower));
        assert_eq!(Keyword::lookup("lower", AdqlVersion::V2_0), None);
        assert_eq!(Keyword::lookup("offset", AdqlVersion::V2_0), None);
    }

    #[test]
    fn test_regular_identifiers() {
        assert!(is_regular_identifier("aTable"));
        assert!(is_regular_identifier("col_2"));
        assert!(!is_regular_identifier("_bar"));
        assert!(!is_regular_identifier("2mass"));
        assert!(!is_regular_identifier("café"));
    }

    #[test]
    fn test_sql_reserved() {
        assert!(is_sql_reserved("date"));
        assert!(is_sql_reserved("Public"));
        assert!(!is_sql_reserved("ra"));
    }
}
