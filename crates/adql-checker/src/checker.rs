//! Resolution of tables and columns against published metadata

use crate::scope::{Lookup, Scope, ScopeColumn, ScopeTable};
use adql_ast::search::{columns_of_query, nested_queries};
use adql_ast::{
    Ast, ColumnBinding, DbTable, DbType, DbTypeKind, ExpectedType, Identifier, NodeId, NodeKind,
    QueryChecker, TableRef, TableSearch, ValueTypes, WithItem,
};
use adql_diagnostics::{
    ADQL0102, ADQL0103, ADQL0104, ADQL0105, ADQL0106, ADQL0107, CheckError, ErrorCode,
    PositionedError, TextPosition,
};
use std::collections::HashSet;

/// Checks queries against a list of published tables.
///
/// Every column reference is bound to the column it designates, so that
/// [`Ast::value_types`] answers with the column's real type afterwards.
/// All problems of a query are reported together.
#[derive(Debug, Clone, Default)]
pub struct DbChecker {
    tables: Vec<DbTable>,
}

impl DbChecker {
    pub fn new(tables: impl IntoIterator<Item = DbTable>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn tables(&self) -> &[DbTable] {
        &self.tables
    }
}

impl QueryChecker for DbChecker {
    fn check(&self, ast: &mut Ast, query: NodeId) -> Result<(), CheckError> {
        let mut run = CheckRun {
            tables: &self.tables,
            errors: Vec::new(),
        };
        run.query(ast, query, None, &[]);
        log::debug!(
            "checked query against {} table(s): {} error(s)",
            self.tables.len(),
            run.errors.len()
        );
        if run.errors.is_empty() {
            Ok(())
        } else {
            Err(CheckError::new(run.errors))
        }
    }
}

/// A named query of a WITH clause
#[derive(Debug, Clone)]
struct CommonTable {
    label: Identifier,
    columns: Vec<ScopeColumn>,
}

/// Select-list alias usable in GROUP BY and ORDER BY
type SelectAlias = (Identifier, Option<ColumnBinding>);

struct CheckRun<'c> {
    tables: &'c [DbTable],
    errors: Vec<PositionedError>,
}

impl CheckRun<'_> {
    /// Check `query` and return the columns it produces
    fn query(
        &mut self,
        ast: &mut Ast,
        query: NodeId,
        outer: Option<&Scope<'_>>,
        ctes: &[CommonTable],
    ) -> Vec<ScopeColumn> {
        match ast.kind(query) {
            NodeKind::Select(_) => self.select(ast, query, outer, ctes),
            NodeKind::SetOperation(_) => self.set_operation(ast, query, outer, ctes),
            _ => Vec::new(),
        }
    }

    fn select(
        &mut self,
        ast: &mut Ast,
        query: NodeId,
        outer: Option<&Scope<'_>>,
        ctes: &[CommonTable],
    ) -> Vec<ScopeColumn> {
        let &[with, select, from, _, group_by, _, order_by] = ast.children(query) else {
            return Vec::new();
        };
        let mut checked = Vec::new();
        let ctes = self.with_clause(ast, with, outer, ctes, &mut checked);
        let mut scope = Scope::new(outer);
        self.from_content(ast, from, &mut scope, outer, &ctes, &mut checked);

        let alias_clauses: HashSet<NodeId> = ast
            .descendants(group_by)
            .into_iter()
            .chain(ast.descendants(order_by))
            .collect();
        let (late, early): (Vec<NodeId>, Vec<NodeId>) = columns_of_query(ast, query)
            .nodes()
            .into_iter()
            .partition(|id| alias_clauses.contains(id));
        for column in early {
            self.column(ast, column, &scope, &[]);
        }
        let aliases = select_aliases(ast, select);
        for column in late {
            self.column(ast, column, &scope, &aliases);
        }

        let output = self.output_columns(ast, select, &scope);
        for nested in nested_queries(ast, query) {
            if !checked.contains(&nested) {
                self.query(ast, nested, Some(&scope), &ctes);
            }
        }
        output
    }

    /// Both operands are checked on their own; ORDER BY refers to the
    /// columns of the left one
    fn set_operation(
        &mut self,
        ast: &mut Ast,
        query: NodeId,
        outer: Option<&Scope<'_>>,
        ctes: &[CommonTable],
    ) -> Vec<ScopeColumn> {
        let &[with, left, right, _] = ast.children(query) else {
            return Vec::new();
        };
        let ctes = self.with_clause(ast, with, outer, ctes, &mut Vec::new());
        let columns = self.query(ast, left, outer, &ctes);
        self.query(ast, right, outer, &ctes);

        let mut scope = Scope::new(outer);
        scope.push(ScopeTable::derived(Identifier::regular(""), columns.clone()));
        for column in columns_of_query(ast, query).nodes() {
            self.column(ast, column, &scope, &[]);
        }
        columns
    }

    fn with_clause(
        &mut self,
        ast: &mut Ast,
        with: NodeId,
        outer: Option<&Scope<'_>>,
        ctes: &[CommonTable],
        checked: &mut Vec<NodeId>,
    ) -> Vec<CommonTable> {
        let mut ctes = ctes.to_vec();
        for item in ast.children(with).to_vec() {
            let NodeKind::WithItem(WithItem { label, columns: names }) = ast.kind(item).clone()
            else {
                continue;
            };
            let Some(inner) = ast.child(item, 0) else {
                continue;
            };
            checked.push(inner);
            let mut columns = self.query(ast, inner, outer, &ctes);
            if !names.is_empty() && names.len() != columns.len() {
                self.error(
                    ADQL0107,
                    format!(
                        "The WITH item \"{}\" names {} column(s) but its query returns {}!",
                        label.name,
                        names.len(),
                        columns.len()
                    ),
                    ast.position(item),
                );
            }
            for (column, name) in columns.iter_mut().zip(names) {
                column.db_name = name.name.clone();
                column.name = name;
            }
            ctes.push(CommonTable { label, columns });
        }
        ctes
    }

    fn from_content(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        scope: &mut Scope<'_>,
        outer: Option<&Scope<'_>>,
        ctes: &[CommonTable],
        checked: &mut Vec<NodeId>,
    ) {
        match ast.kind(id).clone() {
            NodeKind::Table(table) => {
                if let Some(table) = self.table(ast, id, &table, ctes) {
                    scope.push(table);
                }
            }
            NodeKind::SubqueryTable(subquery) => {
                let Some(inner) = ast.child(id, 0) else {
                    return;
                };
                checked.push(inner);
                let columns = self.query(ast, inner, outer, ctes);
                scope.push(ScopeTable::derived(subquery.alias, columns));
            }
            NodeKind::Join(join) => {
                let &[left, right, ..] = ast.children(id) else {
                    return;
                };
                let start = scope.tables().len();
                self.from_content(ast, left, scope, outer, ctes, checked);
                let middle = scope.tables().len();
                self.from_content(ast, right, scope, outer, ctes, checked);
                let end = scope.tables().len();

                let shared = if join.natural {
                    scope.common_columns(start..middle, middle..end)
                } else {
                    join.using
                };
                let position = ast.position(id);
                for name in shared {
                    let on_left = scope.candidates(&name, start..middle);
                    let on_right = scope.candidates(&name, middle..end);
                    match (on_left.as_slice(), on_right.as_slice()) {
                        ([left], [right]) => {
                            let tables = left.tables.iter().chain(&right.tables).copied().collect();
                            scope.merge(name, tables, left.binding.clone());
                        }
                        ([], _) | (_, []) => self.error(
                            ADQL0103,
                            format!("Unknown column \"{name}\" in the join condition!"),
                            position,
                        ),
                        _ => self.error(
                            ADQL0104,
                            format!("Ambiguous column \"{name}\" in the join condition!"),
                            position,
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    fn table(
        &mut self,
        ast: &Ast,
        id: NodeId,
        table: &TableRef,
        ctes: &[CommonTable],
    ) -> Option<ScopeTable> {
        let name = &table.name;
        if name.schema.is_none() && name.catalog.is_none() {
            if let Some(cte) = ctes.iter().rev().find(|cte| cte.label.same_as(&name.table)) {
                let alias = table.alias.clone().unwrap_or_else(|| cte.label.clone());
                return Some(ScopeTable::derived(alias, cte.columns.clone()));
            }
        }
        let tables = self.tables;
        match tables.search(name).as_slice() {
            [found] => Some(ScopeTable::published(found, table.alias.clone())),
            [] => {
                self.error(ADQL0102, format!("Unknown table \"{name}\"!"), ast.position(id));
                None
            }
            many => {
                let names: Vec<String> = many.iter().map(|t| t.full_name()).collect();
                self.error(
                    ADQL0105,
                    format!(
                        "Ambiguous table name \"{name}\"! It may be (at least) {}.",
                        alternatives(&names)
                    ),
                    ast.position(id),
                );
                None
            }
        }
    }

    fn column(&mut self, ast: &mut Ast, id: NodeId, scope: &Scope<'_>, aliases: &[SelectAlias]) {
        let NodeKind::Column(column) = ast.kind(id) else {
            return;
        };
        let name = column.name.clone();
        if name.table.is_none() {
            if let Some((_, binding)) = aliases.iter().find(|(alias, _)| alias.same_as(&name.column)) {
                if let Some(binding) = binding.clone() {
                    self.bind(ast, id, binding);
                }
                return;
            }
        }
        let position = ast.position(id);
        match scope.lookup(&name) {
            Lookup::Found(binding) => self.bind(ast, id, binding),
            Lookup::Ambiguous(candidates) => self.error(
                ADQL0104,
                format!(
                    "Ambiguous column name \"{name}\"! It may be (at least) {}.",
                    alternatives(&candidates)
                ),
                position,
            ),
            Lookup::UnknownTable => {
                let qualifier = name.table.as_ref().map(|t| t.to_adql()).unwrap_or_default();
                self.error(
                    ADQL0102,
                    format!("Unknown table \"{qualifier}\" in column reference \"{name}\"!"),
                    position,
                );
            }
            Lookup::Unknown => self.error(ADQL0103, format!("Unknown column \"{name}\"!"), position),
        }
    }

    /// Attach `binding`, reporting a column whose type contradicts what the
    /// surrounding expression expects
    fn bind(&mut self, ast: &mut Ast, id: NodeId, binding: ColumnBinding) {
        let position = ast.position(id);
        let NodeKind::Column(column) = ast.kind_mut(id) else {
            return;
        };
        if let Some(expected) = column.expected {
            if !ValueTypes::from_db_type(&binding.datatype).allows(expected) {
                let what = match expected {
                    ExpectedType::Numeric => "A numeric",
                    ExpectedType::String => "A string",
                    ExpectedType::Geometry => "A geometry",
                };
                self.error(
                    ADQL0106,
                    format!(
                        "Type mismatch! {what} value was expected instead of column \"{}\" of type {}.",
                        column.name, binding.datatype
                    ),
                    position,
                );
            }
        }
        column.binding = Some(binding);
    }

    /// Columns a query produces, as seen by an enclosing FROM clause
    fn output_columns(&mut self, ast: &Ast, select: NodeId, scope: &Scope<'_>) -> Vec<ScopeColumn> {
        let mut columns = Vec::new();
        for &item in ast.children(select) {
            match ast.kind(item) {
                NodeKind::SelectAll(all) => match &all.table {
                    None => {
                        columns.extend(scope.tables().iter().flat_map(|t| t.columns.iter().cloned()))
                    }
                    Some(qualifier) => {
                        let tables = scope.tables_for(qualifier);
                        if tables.is_empty() {
                            self.error(
                                ADQL0102,
                                format!("Unknown table \"{qualifier}\" in \"{qualifier}.*\"!"),
                                ast.position(item),
                            );
                        }
                        columns.extend(tables.into_iter().flat_map(|t| t.columns.iter().cloned()));
                    }
                },
                NodeKind::SelectItem(select_item) => {
                    let Some(operand) = ast.child(item, 0) else {
                        continue;
                    };
                    let column = match ast.kind(operand) {
                        NodeKind::Column(column) => Some(column),
                        _ => None,
                    };
                    let Some(name) = select_item
                        .alias
                        .clone()
                        .or_else(|| column.map(|c| c.name.column.clone()))
                    else {
                        continue;
                    };
                    let datatype = match column.and_then(|c| c.binding.as_ref()) {
                        Some(binding) => binding.datatype,
                        None => datatype_of(ast.value_types(operand)),
                    };
                    let db_name = match (&select_item.alias, column.and_then(|c| c.binding.as_ref())) {
                        (None, Some(binding)) => binding.db_name.clone(),
                        _ => name.name.clone(),
                    };
                    columns.push(ScopeColumn {
                        name,
                        db_name,
                        datatype,
                    });
                }
                _ => {}
            }
        }
        columns
    }

    fn error(&mut self, code: ErrorCode, message: String, position: Option<TextPosition>) {
        log::trace!("{code}: {message}");
        self.errors.push(PositionedError::new(code, message, position));
    }
}

fn select_aliases(ast: &Ast, select: NodeId) -> Vec<SelectAlias> {
    ast.children(select)
        .iter()
        .filter_map(|&item| {
            let NodeKind::SelectItem(select_item) = ast.kind(item) else {
                return None;
            };
            let alias = select_item.alias.clone()?;
            let binding = ast.child(item, 0).and_then(|operand| match ast.kind(operand) {
                NodeKind::Column(column) => column.binding.clone(),
                _ => None,
            });
            Some((alias, binding))
        })
        .collect()
}

/// Closest metadata type for an expression of a derived table
fn datatype_of(types: ValueTypes) -> DbType {
    let kind = match (types.numeric, types.string, types.geometry) {
        (true, false, false) => DbTypeKind::UnknownNumeric,
        (false, true, false) => DbTypeKind::Varchar,
        (false, false, true) => DbTypeKind::Region,
        _ => DbTypeKind::Unknown,
    };
    DbType::new(kind)
}

/// `"a" or "b"`, `"a", "b" or "c"`
fn alternatives(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {last}", rest.join(", ")),
        _ => quoted.concat(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alternatives() {
        let names = |n: &[&str]| n.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(alternatives(&names(&["a.x"])), "\"a.x\"");
        assert_eq!(alternatives(&names(&["a.x", "b.x"])), "\"a.x\" or \"b.x\"");
        assert_eq!(
            alternatives(&names(&["a.x", "b.x", "c.x"])),
            "\"a.x\", \"b.x\" or \"c.x\""
        );
    }

    #[test]
    fn test_derived_datatype() {
        assert_eq!(datatype_of(ValueTypes::NUMERIC).kind, DbTypeKind::UnknownNumeric);
        assert_eq!(datatype_of(ValueTypes::STRING).kind, DbTypeKind::Varchar);
        assert_eq!(datatype_of(ValueTypes::ANY).kind, DbTypeKind::Unknown);
    }
}
