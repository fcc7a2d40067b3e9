//! Tables and columns visible while resolving column references
//!
//! Every query gets its own [`Scope`] holding the tables of its FROM clause.
//! A nested query's scope points at the scope of the query it is nested in,
//! which is where correlated references are resolved.

use adql_ast::{ColumnBinding, ColumnName, DbColumn, DbTable, DbType, Identifier, TableName};
use std::ops::Range;

/// A column provided by a FROM item
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeColumn {
    pub name: Identifier,
    pub db_name: String,
    pub datatype: DbType,
}

impl ScopeColumn {
    pub fn from_db(column: &DbColumn) -> Self {
        Self {
            name: Identifier::regular(&column.adql_name),
            db_name: column.db_name().to_string(),
            datatype: column.datatype,
        }
    }
}

/// A table of a FROM clause: a published table or a derived one
#[derive(Debug, Clone)]
pub struct ScopeTable {
    /// Alias or full name, reported in bindings and messages
    pub label: String,
    alias: Option<Identifier>,
    /// Published table this stands for, without its columns
    published: Option<DbTable>,
    pub columns: Vec<ScopeColumn>,
}

impl ScopeTable {
    pub fn published(table: &DbTable, alias: Option<Identifier>) -> Self {
        let header = DbTable {
            catalog: table.catalog.clone(),
            schema: table.schema.clone(),
            name: table.name.clone(),
            db_name: table.db_name.clone(),
            columns: Vec::new(),
        };
        Self {
            label: alias
                .as_ref()
                .map_or_else(|| table.full_name(), |alias| alias.name.clone()),
            alias,
            published: Some(header),
            columns: table.columns.iter().map(ScopeColumn::from_db).collect(),
        }
    }

    /// Subquery or common table, always known by `alias`
    pub fn derived(alias: Identifier, columns: Vec<ScopeColumn>) -> Self {
        Self {
            label: alias.name.clone(),
            alias: Some(alias),
            published: None,
            columns,
        }
    }

    /// Whether `qualifier` designates this table. An aliased table answers
    /// only to its alias.
    pub fn answers_to(&self, qualifier: &TableName) -> bool {
        match (&self.alias, &self.published) {
            (Some(alias), _) => {
                qualifier.catalog.is_none()
                    && qualifier.schema.is_none()
                    && qualifier.table.same_as(alias)
            }
            (None, Some(published)) => published.matches(qualifier),
            (None, None) => false,
        }
    }

    fn binding(&self, column: &ScopeColumn) -> ColumnBinding {
        ColumnBinding {
            table: self.label.clone(),
            db_name: column.db_name.clone(),
            datatype: column.datatype,
        }
    }
}

/// A column that may be designated by one of several tables
#[derive(Debug, Clone)]
pub struct Candidate {
    pub tables: Vec<usize>,
    pub binding: ColumnBinding,
}

/// Column shared by the two sides of a `USING` or `NATURAL` join
#[derive(Debug, Clone)]
struct MergedColumn {
    name: Identifier,
    tables: Vec<usize>,
    binding: ColumnBinding,
}

/// Result of resolving a column name
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ColumnBinding),
    /// `table.column` designations of every match
    Ambiguous(Vec<String>),
    /// No table answers to the qualifier
    UnknownTable,
    Unknown,
}

#[derive(Debug, Default)]
pub struct Scope<'p> {
    tables: Vec<ScopeTable>,
    merged: Vec<MergedColumn>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    pub fn new(parent: Option<&'p Scope<'p>>) -> Self {
        Self {
            tables: Vec::new(),
            merged: Vec::new(),
            parent,
        }
    }

    pub fn tables(&self) -> &[ScopeTable] {
        &self.tables
    }

    pub fn push(&mut self, table: ScopeTable) {
        self.tables.push(table);
    }

    /// Record that `name` designates one column across `tables`
    pub fn merge(&mut self, name: Identifier, tables: Vec<usize>, binding: ColumnBinding) {
        self.merged.push(MergedColumn {
            name,
            tables,
            binding,
        });
    }

    /// Local tables answering to `qualifier`
    pub fn tables_for(&self, qualifier: &TableName) -> Vec<&ScopeTable> {
        self.tables
            .iter()
            .filter(|table| table.answers_to(qualifier))
            .collect()
    }

    /// Columns called `name` among the tables in `range`, a merged column
    /// counting once
    pub fn candidates(&self, name: &Identifier, range: Range<usize>) -> Vec<Candidate> {
        let mut found = Vec::new();
        for index in range.clone() {
            let table = &self.tables[index];
            for column in table.columns.iter().filter(|c| c.name.same_as(name)) {
                found.push(Candidate {
                    tables: vec![index],
                    binding: table.binding(column),
                });
            }
        }
        for merged in &self.merged {
            if !merged.name.same_as(name) || !merged.tables.iter().all(|t| range.contains(t)) {
                continue;
            }
            found.retain(|c: &Candidate| !c.tables.iter().any(|t| merged.tables.contains(t)));
            found.push(Candidate {
                tables: merged.tables.clone(),
                binding: merged.binding.clone(),
            });
        }
        found
    }

    /// Names of the columns present on both sides of a join
    pub fn common_columns(&self, left: Range<usize>, right: Range<usize>) -> Vec<Identifier> {
        let mut common: Vec<Identifier> = Vec::new();
        for table in &self.tables[left] {
            for column in &table.columns {
                if common.iter().any(|name| name.same_as(&column.name)) {
                    continue;
                }
                if !self.candidates(&column.name, right.clone()).is_empty() {
                    common.push(column.name.clone());
                }
            }
        }
        common
    }

    /// Resolve `name` here, then in the enclosing scopes
    pub fn lookup(&self, name: &ColumnName) -> Lookup {
        match self.lookup_local(name) {
            Lookup::Unknown if name.table.is_none() => self
                .parent
                .map_or(Lookup::Unknown, |parent| parent.lookup(name)),
            Lookup::UnknownTable => self
                .parent
                .map_or(Lookup::UnknownTable, |parent| parent.lookup(name)),
            resolved => resolved,
        }
    }

    fn lookup_local(&self, name: &ColumnName) -> Lookup {
        let candidates: Vec<ColumnBinding> = match &name.table {
            None => self
                .candidates(&name.column, 0..self.tables.len())
                .into_iter()
                .map(|c| c.binding)
                .collect(),
            Some(qualifier) => {
                let tables = self.tables_for(qualifier);
                if tables.is_empty() {
                    return Lookup::UnknownTable;
                }
                tables
                    .into_iter()
                    .flat_map(|table| {
                        table
                            .columns
                            .iter()
                            .filter(|c| c.name.same_as(&name.column))
                            .map(|c| table.binding(c))
                    })
                    .collect()
            }
        };
        match <[ColumnBinding; 1]>::try_from(candidates) {
            Ok([binding]) => Lookup::Found(binding),
            Err(candidates) if candidates.is_empty() => Lookup::Unknown,
            Err(candidates) => Lookup::Ambiguous(
                candidates
                    .iter()
                    .map(|b| format!("{}.{}", b.table, name.column.to_adql()))
                    .collect(),
            ),
        }
    }
}
