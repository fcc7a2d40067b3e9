//! Identifiers and qualified names

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table, column, schema or alias name.
///
/// Regular identifiers compare case-insensitively; delimited ones
/// (written between double quotes) compare exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub delimited: bool,
}

impl Identifier {
    pub fn regular(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delimited: false,
        }
    }

    pub fn delimited(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delimited: true,
        }
    }

    /// Compare with a plain name, honouring this identifier's case sensitivity
    pub fn matches(&self, name: &str) -> bool {
        if self.delimited {
            self.name == name
        } else {
            self.name.eq_ignore_ascii_case(name)
        }
    }

    /// Compare two identifiers; the comparison is exact if either is delimited
    pub fn same_as(&self, other: &Identifier) -> bool {
        if self.delimited || other.delimited {
            self.name == other.name
        } else {
            self.name.eq_ignore_ascii_case(&other.name)
        }
    }

    pub fn to_adql(&self) -> String {
        if self.delimited {
            format!("\"{}\"", self.name.replace('"', "\"\""))
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_adql())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::regular(s)
    }
}

/// `[[catalog.]schema.]table`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub catalog: Option<Identifier>,
    pub schema: Option<Identifier>,
    pub table: Identifier,
}

impl TableName {
    pub fn new(table: impl Into<Identifier>) -> Self {
        Self {
            catalog: None,
            schema: None,
            table: table.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<Identifier>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<Identifier>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Build from 1 to 3 dotted parts
    pub fn from_parts(mut parts: Vec<Identifier>) -> Option<Self> {
        let table = parts.pop()?;
        let schema = parts.pop();
        let catalog = parts.pop();
        parts.is_empty().then_some(Self {
            catalog,
            schema,
            table,
        })
    }

    pub fn to_adql(&self) -> String {
        let mut out = String::new();
        for part in [&self.catalog, &self.schema].into_iter().flatten() {
            out.push_str(&part.to_adql());
            out.push('.');
        }
        out.push_str(&self.table.to_adql());
        out
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_adql())
    }
}

/// `[[[catalog.]schema.]table.]column`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnName {
    pub table: Option<TableName>,
    pub column: Identifier,
}

impl ColumnName {
    pub fn new(column: impl Into<Identifier>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: TableName, column: impl Into<Identifier>) -> Self {
        Self {
            table: Some(table),
            column: column.into(),
        }
    }

    /// Build from 1 to 4 dotted parts
    pub fn from_parts(mut parts: Vec<Identifier>) -> Option<Self> {
        let column = parts.pop()?;
        let table = if parts.is_empty() {
            None
        } else {
            Some(TableName::from_parts(parts)?)
        };
        Some(Self { table, column })
    }

    pub fn to_adql(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table.to_adql(), self.column.to_adql()),
            None => self.column.to_adql(),
        }
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_adql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_rendering_escapes_quotes() {
        assert_eq!(Identifier::delimited("a\"b").to_adql(), "\"a\"\"b\"");
        assert_eq!(Identifier::regular("ra").to_adql(), "ra");
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(Identifier::regular("RA").matches("ra"));
        assert!(!Identifier::delimited("RA").matches("ra"));
        assert!(Identifier::regular("Ra").same_as(&Identifier::regular("rA")));
        assert!(!Identifier::regular("Ra").same_as(&Identifier::delimited("rA")));
    }

    #[test]
    fn test_column_from_parts() {
        let name = ColumnName::from_parts(vec![
            "cat".into(),
            "sch".into(),
            "tab".into(),
            "col".into(),
        ])
        .unwrap();
        assert_eq!(name.to_adql(), "cat.sch.tab.col");
        assert!(ColumnName::from_parts(vec!["a".into(); 5]).is_none());
    }
}
