//! Database metadata consumed by query checkers
//!
//! This is the minimal contract a schema-aware checker needs: tables with
//! their columns and a coarse classification of column datatypes. It does
//! not describe how the metadata is obtained.

use crate::{Ast, Identifier, NodeId, TableName};
use adql_diagnostics::CheckError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Column datatypes known to the metadata layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DbTypeKind {
    Smallint,
    Integer,
    Bigint,
    Real,
    Double,
    Binary,
    Varbinary,
    Blob,
    Char,
    Varchar,
    Clob,
    Timestamp,
    Point,
    Region,
    /// Type could not be determined
    Unknown,
    /// Type could not be determined but is known to be numeric
    UnknownNumeric,
}

impl DbTypeKind {
    pub fn sql_name(&self) -> &'static str {
        match self {
            DbTypeKind::Smallint => "SMALLINT",
            DbTypeKind::Integer => "INTEGER",
            DbTypeKind::Bigint => "BIGINT",
            DbTypeKind::Real => "REAL",
            DbTypeKind::Double => "DOUBLE",
            DbTypeKind::Binary => "BINARY",
            DbTypeKind::Varbinary => "VARBINARY",
            DbTypeKind::Blob => "BLOB",
            DbTypeKind::Char => "CHAR",
            DbTypeKind::Varchar => "VARCHAR",
            DbTypeKind::Clob => "CLOB",
            DbTypeKind::Timestamp => "TIMESTAMP",
            DbTypeKind::Point => "POINT",
            DbTypeKind::Region => "REGION",
            DbTypeKind::Unknown => "UNKNOWN",
            DbTypeKind::UnknownNumeric => "UNKNOWN_NUMERIC",
        }
    }

    fn from_sql_name(name: &str) -> Option<Self> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let kind = match normalized.as_str() {
            "SMALLINT" => DbTypeKind::Smallint,
            "INTEGER" | "INT" => DbTypeKind::Integer,
            "BIGINT" => DbTypeKind::Bigint,
            "REAL" | "FLOAT" => DbTypeKind::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "DECIMAL" | "NUMERIC" => DbTypeKind::Double,
            "BINARY" => DbTypeKind::Binary,
            "VARBINARY" => DbTypeKind::Varbinary,
            "BLOB" => DbTypeKind::Blob,
            "CHAR" | "CHARACTER" => DbTypeKind::Char,
            "VARCHAR" | "CHARACTER VARYING" => DbTypeKind::Varchar,
            "CLOB" => DbTypeKind::Clob,
            "TIMESTAMP" => DbTypeKind::Timestamp,
            "POINT" => DbTypeKind::Point,
            "REGION" => DbTypeKind::Region,
            "UNKNOWN" => DbTypeKind::Unknown,
            "UNKNOWN_NUMERIC" => DbTypeKind::UnknownNumeric,
            _ => return None,
        };
        Some(kind)
    }
}

/// Array dimension of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArraySize {
    Fixed(u32),
    Variable,
}

/// Datatype of a column or a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbType {
    pub kind: DbTypeKind,
    /// Length of CHAR/VARCHAR/BINARY types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<ArraySize>,
}

static SQL_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*([A-Za-z_][A-Za-z_ ]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*(?:\[\s*(\d*)\s*\])?\s*$",
    )
        .expect("valid type regex")
});

impl DbType {
    pub const UNKNOWN: DbType = DbType::new(DbTypeKind::Unknown);

    pub const fn new(kind: DbTypeKind) -> Self {
        Self {
            kind,
            length: None,
            array: None,
        }
    }

    pub const fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub const fn with_array(mut self, array: ArraySize) -> Self {
        self.array = Some(array);
        self
    }

    /// Parse an SQL type such as `VARCHAR(32)`, `DOUBLE PRECISION` or
    /// `REAL[3]`. Returns `None` for unrecognised type names.
    pub fn from_sql(text: &str) -> Option<Self> {
        let captures = SQL_TYPE.captures(text)?;
        let name = captures.get(1)?.as_str().trim();
        let kind = DbTypeKind::from_sql_name(name)?;
        // DECIMAL(precision, scale) has no length
        let exact = ["DECIMAL", "NUMERIC"].iter().any(|n| name.eq_ignore_ascii_case(n));
        if captures.get(3).is_some() && !exact {
            return None;
        }
        let length = match captures.get(2) {
            Some(m) if !exact => Some(m.as_str().parse().ok()?),
            _ => None,
        };
        let array = match captures.get(4) {
            Some(m) if m.as_str().is_empty() => Some(ArraySize::Variable),
            Some(m) => Some(ArraySize::Fixed(m.as_str().parse().ok()?)),
            None => None,
        };
        Some(Self {
            kind,
            length,
            array,
        })
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == DbTypeKind::Unknown
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind,
            DbTypeKind::Smallint
                | DbTypeKind::Integer
                | DbTypeKind::Bigint
                | DbTypeKind::Real
                | DbTypeKind::Double
                | DbTypeKind::Binary
                | DbTypeKind::Varbinary
                | DbTypeKind::Blob
                | DbTypeKind::Unknown
                | DbTypeKind::UnknownNumeric
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.kind,
            DbTypeKind::Char
                | DbTypeKind::Varchar
                | DbTypeKind::Clob
                | DbTypeKind::Timestamp
                | DbTypeKind::Unknown
        )
    }

    pub fn is_geometry(&self) -> bool {
        matches!(
            self.kind,
            DbTypeKind::Point | DbTypeKind::Region | DbTypeKind::Unknown
        )
    }

    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.sql_name())?;
        if let Some(length) = self.length {
            write!(f, "({length})")?;
        }
        match self.array {
            Some(ArraySize::Fixed(n)) => write!(f, "[{n}]"),
            Some(ArraySize::Variable) => f.write_str("[]"),
            None => Ok(()),
        }
    }
}

/// A column of a published table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbColumn {
    /// Name used in ADQL queries
    pub adql_name: String,
    /// Name in the database, when different
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default = "unknown_type")]
    pub datatype: DbType,
}

fn unknown_type() -> DbType {
    DbType::UNKNOWN
}

impl DbColumn {
    pub fn new(adql_name: impl Into<String>, datatype: DbType) -> Self {
        Self {
            adql_name: adql_name.into(),
            db_name: None,
            datatype,
        }
    }

    pub fn db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.adql_name)
    }
}

/// A published table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Name used in ADQL queries
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default)]
    pub columns: Vec<DbColumn>,
}

impl DbTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: name.into(),
            db_name: None,
            columns: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: DbColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// The column called `name`, if exactly one matches.
    ///
    /// Without case sensitivity two columns differing only by case make the
    /// lookup ambiguous and nothing is returned.
    pub fn column(&self, name: &str, case_sensitive: bool) -> Option<&DbColumn> {
        if case_sensitive {
            return self.columns.iter().find(|c| c.adql_name == name);
        }
        let mut found = self
            .columns
            .iter()
            .filter(|c| c.adql_name.eq_ignore_ascii_case(name));
        match (found.next(), found.next()) {
            (Some(column), None) => Some(column),
            _ => None,
        }
    }

    /// Whether this table is the one an ADQL table name designates
    pub fn matches(&self, name: &TableName) -> bool {
        fn part_matches(part: Option<&Identifier>, value: Option<&str>) -> bool {
            match (part, value) {
                (None, _) => true,
                (Some(id), Some(value)) => id.matches(value),
                (Some(_), None) => false,
            }
        }
        name.table.matches(&self.name)
            && part_matches(name.schema.as_ref(), self.schema.as_deref())
            && part_matches(name.catalog.as_ref(), self.catalog.as_deref())
    }

    /// Fully qualified ADQL name
    pub fn full_name(&self) -> String {
        [self.catalog.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Lookup of published tables by ADQL name
pub trait TableSearch {
    /// Every table the name may designate
    fn search(&self, name: &TableName) -> Vec<&DbTable>;
}

impl TableSearch for [DbTable] {
    fn search(&self, name: &TableName) -> Vec<&DbTable> {
        self.iter().filter(|t| t.matches(name)).collect()
    }
}

impl TableSearch for Vec<DbTable> {
    fn search(&self, name: &TableName) -> Vec<&DbTable> {
        self.as_slice().search(name)
    }
}

/// Post-parse semantic check of a query tree.
///
/// Implementations receive the whole query and must descend into nested
/// queries themselves. They may annotate the tree, typically binding column
/// references to their metadata.
pub trait QueryChecker {
    fn check(&self, ast: &mut Ast, query: NodeId) -> Result<(), CheckError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql() {
        assert_eq!(
            DbType::from_sql("varchar(32)"),
            Some(DbType::new(DbTypeKind::Varchar).with_length(32))
        );
        assert_eq!(
            DbType::from_sql("DOUBLE  PRECISION[]"),
            Some(DbType::new(DbTypeKind::Double).with_array(ArraySize::Variable))
        );
        assert_eq!(DbType::from_sql("REAL[3]").map(|t| t.to_string()).as_deref(), Some("REAL[3]"));
        assert_eq!(DbType::from_sql("JSONB"), None);
    }

    #[test]
    fn test_from_sql_decimal() {
        assert_eq!(
            DbType::from_sql("DECIMAL(10, 2)"),
            Some(DbType::new(DbTypeKind::Double))
        );
        assert_eq!(DbType::from_sql("numeric(5)"), Some(DbType::new(DbTypeKind::Double)));
        assert_eq!(DbType::from_sql("VARCHAR(10,2)"), None);
    }

    #[test]
    fn test_classification() {
        let unknown = DbType::UNKNOWN;
        assert!(unknown.is_numeric() && unknown.is_string() && unknown.is_geometry());
        let numeric = DbType::new(DbTypeKind::UnknownNumeric);
        assert!(numeric.is_numeric() && !numeric.is_string());
        assert!(DbType::new(DbTypeKind::Blob).is_numeric());
        assert!(DbType::new(DbTypeKind::Timestamp).is_string());
    }

    #[test]
    fn test_column_lookup() {
        let table = DbTable::new("t")
            .with_column(DbColumn::new("ra", DbType::new(DbTypeKind::Double)))
            .with_column(DbColumn::new("Mag", DbType::new(DbTypeKind::Real)))
            .with_column(DbColumn::new("mag", DbType::new(DbTypeKind::Real)));
        assert!(table.column("RA", false).is_some());
        assert!(table.column("RA", true).is_none());
        assert!(table.column("MAG", false).is_none());
        assert_eq!(table.column("Mag", true).map(|c| c.adql_name.as_str()), Some("Mag"));
    }

    #[test]
    fn test_table_matching() {
        let table = DbTable::new("obs").with_schema("ivoa");
        assert!(table.matches(&TableName::new("OBS")));
        assert!(table.matches(&TableName::new("obs").with_schema("ivoa")));
        assert!(!table.matches(&TableName::new("obs").with_schema("tap")));
        assert!(!table.matches(&TableName::new(Identifier::delimited("OBS"))));
    }
}
