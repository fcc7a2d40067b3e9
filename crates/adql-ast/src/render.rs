//! Canonical ADQL rendering
//!
//! Output is a single line with one space between tokens. Keywords are
//! upper case, identifiers keep their spelling and quoting, numbers keep
//! their literal text.

use crate::{Ast, JoinKind, NodeId, NodeKind};
use std::fmt::{self, Write};

impl Ast {
    /// ADQL text of the subtree rooted at `id`
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// ADQL text of the whole tree; empty without a root
    pub fn to_adql(&self) -> String {
        self.root().map(|root| self.render(root)).unwrap_or_default()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let children = self.children(id);
        match self.kind(id) {
            NodeKind::Select(query) => {
                self.write_with(children[0], out);
                self.write_node(children[1], out);
                out.push_str(" FROM ");
                self.write_node(children[2], out);
                self.write_clause(" WHERE ", children[3], out);
                self.write_clause(" GROUP BY ", children[4], out);
                self.write_clause(" HAVING ", children[5], out);
                self.write_clause(" ORDER BY ", children[6], out);
                if let Some(offset) = query.offset {
                    let _ = write!(out, " OFFSET {offset}");
                }
            }
            NodeKind::SetOperation(set) => {
                self.write_with(children[0], out);
                self.write_set_operand(id, children[1], false, out);
                out.push(' ');
                out.push_str(set.op.keyword());
                if set.all {
                    out.push_str(" ALL");
                }
                out.push(' ');
                self.write_set_operand(id, children[2], true, out);
                self.write_clause(" ORDER BY ", children[3], out);
                if let Some(offset) = set.offset {
                    let _ = write!(out, " OFFSET {offset}");
                }
            }
            NodeKind::With => self.write_list(children, ", ", out),
            NodeKind::WithItem(item) => {
                out.push_str(&item.label.to_adql());
                if !item.columns.is_empty() {
                    let columns: Vec<_> = item.columns.iter().map(|c| c.to_adql()).collect();
                    let _ = write!(out, "({})", columns.join(", "));
                }
                out.push_str(" AS (");
                self.write_node(children[0], out);
                out.push(')');
            }
            NodeKind::SelectClause(clause) => {
                out.push_str("SELECT ");
                if clause.distinct {
                    out.push_str("DISTINCT ");
                }
                if let Some(top) = clause.top {
                    let _ = write!(out, "TOP {top} ");
                }
                self.write_list(children, ", ", out);
            }
            NodeKind::SelectItem(item) => {
                self.write_node(children[0], out);
                if let Some(alias) = &item.alias {
                    out.push_str(" AS ");
                    out.push_str(&alias.to_adql());
                }
            }
            NodeKind::SelectAll(all) => match &all.table {
                Some(table) => {
                    let _ = write!(out, "{table}.*");
                }
                None => out.push('*'),
            },
            NodeKind::GroupBy | NodeKind::OrderBy | NodeKind::OperandList => {
                self.write_list(children, ", ", out)
            }
            NodeKind::OrderItem(item) => {
                self.write_node(children[0], out);
                if item.descending {
                    out.push_str(" DESC");
                }
            }
            NodeKind::Table(table) => {
                out.push_str(&table.name.to_adql());
                if let Some(alias) = &table.alias {
                    out.push_str(" AS ");
                    out.push_str(&alias.to_adql());
                }
            }
            NodeKind::SubqueryTable(subquery) => {
                out.push('(');
                self.write_node(children[0], out);
                out.push_str(") AS ");
                out.push_str(&subquery.alias.to_adql());
            }
            NodeKind::Join(join) => {
                let left_needs_parens = join.kind != JoinKind::Cross
                    && matches!(self.kind(children[0]), NodeKind::Join(j) if j.kind == JoinKind::Cross);
                self.write_wrapped(children[0], left_needs_parens, out);
                if join.kind == JoinKind::Cross {
                    out.push_str(", ");
                } else {
                    out.push(' ');
                    if join.natural {
                        out.push_str("NATURAL ");
                    }
                    out.push_str(join.kind.keyword());
                    out.push(' ');
                }
                let right_needs_parens = matches!(self.kind(children[1]), NodeKind::Join(_));
                self.write_wrapped(children[1], right_needs_parens, out);
                if !join.using.is_empty() {
                    let columns: Vec<_> = join.using.iter().map(|c| c.to_adql()).collect();
                    let _ = write!(out, " USING ({})", columns.join(", "));
                } else if !self.children(children[2]).is_empty() {
                    out.push_str(" ON ");
                    self.write_node(children[2], out);
                }
            }
            NodeKind::Constraints(constraints) => {
                if constraints.group {
                    out.push('(');
                }
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        let connector = constraints.connectors.get(i).copied().unwrap_or_default();
                        out.push(' ');
                        out.push_str(connector.keyword());
                        out.push(' ');
                    }
                    self.write_node(child, out);
                }
                if constraints.group {
                    out.push(')');
                }
            }
            NodeKind::Not => {
                out.push_str("NOT ");
                self.write_node(children[0], out);
            }
            NodeKind::Comparison(op) => self.write_binary(children, op.symbol(), out),
            NodeKind::Between { negated } => {
                self.write_node(children[0], out);
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.write_node(children[1], out);
                out.push_str(" AND ");
                self.write_node(children[2], out);
            }
            NodeKind::In { negated } => {
                self.write_node(children[0], out);
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.write_node(children[1], out);
                out.push(')');
            }
            NodeKind::Like {
                negated,
                case_insensitive,
            } => {
                let keyword = match (*negated, *case_insensitive) {
                    (false, false) => "LIKE",
                    (true, false) => "NOT LIKE",
                    (false, true) => "ILIKE",
                    (true, true) => "NOT ILIKE",
                };
                self.write_binary(children, keyword, out);
            }
            NodeKind::IsNull { negated } => {
                self.write_node(children[0], out);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            NodeKind::Exists => {
                out.push_str("EXISTS(");
                self.write_node(children[0], out);
                out.push(')');
            }
            NodeKind::Column(column) => out.push_str(&column.name.to_adql()),
            NodeKind::Numeric(number) => out.push_str(&number.text),
            NodeKind::Text(text) => {
                out.push('\'');
                out.push_str(&text.value.replace('\'', "''"));
                out.push('\'');
            }
            NodeKind::Operation(op) => self.write_binary(children, op.symbol(), out),
            NodeKind::Unary(op) => {
                out.push_str(op.symbol());
                let operand = self.render(children[0]);
                // `--` would start a comment
                if operand.starts_with('-') || operand.starts_with('+') {
                    out.push(' ');
                }
                out.push_str(&operand);
            }
            NodeKind::Concatenation => self.write_list(children, " || ", out),
            NodeKind::Wrapped => {
                out.push('(');
                self.write_node(children[0], out);
                out.push(')');
            }
            NodeKind::Aggregate(aggregate) => {
                out.push_str(aggregate.function.name());
                out.push('(');
                match children.first() {
                    Some(&arg) => {
                        if aggregate.distinct {
                            out.push_str("DISTINCT ");
                        }
                        self.write_node(arg, out);
                    }
                    None => out.push('*'),
                }
                out.push(')');
            }
            NodeKind::Cast(target) => {
                out.push_str("CAST(");
                self.write_node(children[0], out);
                let _ = write!(out, " AS {target})");
            }
            NodeKind::UserFunction(udf) => self.write_call(&udf.name, children, out),
            kind @ (NodeKind::Math(_)
            | NodeKind::Geometry(_)
            | NodeKind::StringFunction(_)
            | NodeKind::Coalesce
            | NodeKind::InUnit) => self.write_call(kind.name(), children, out),
        }
    }

    fn write_with(&self, with: NodeId, out: &mut String) {
        if !self.children(with).is_empty() {
            out.push_str("WITH ");
            self.write_node(with, out);
            out.push(' ');
        }
    }

    fn write_clause(&self, keyword: &str, clause: NodeId, out: &mut String) {
        if !self.children(clause).is_empty() {
            out.push_str(keyword);
            self.write_node(clause, out);
        }
    }

    fn write_list(&self, items: &[NodeId], separator: &str, out: &mut String) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            self.write_node(item, out);
        }
    }

    fn write_binary(&self, children: &[NodeId], operator: &str, out: &mut String) {
        self.write_node(children[0], out);
        out.push(' ');
        out.push_str(operator);
        out.push(' ');
        self.write_node(children[1], out);
    }

    fn write_call(&self, name: &str, args: &[NodeId], out: &mut String) {
        out.push_str(name);
        out.push('(');
        self.write_list(args, ", ", out);
        out.push(')');
    }

    fn write_wrapped(&self, id: NodeId, parens: bool, out: &mut String) {
        if parens {
            out.push('(');
            self.write_node(id, out);
            out.push(')');
        } else {
            self.write_node(id, out);
        }
    }

    /// Operand of a set operation, parenthesised when rendering it bare
    /// would change how it binds
    fn write_set_operand(&self, parent: NodeId, operand: NodeId, right: bool, out: &mut String) {
        let parens = match (self.kind(parent), self.kind(operand)) {
            (NodeKind::SetOperation(outer), NodeKind::SetOperation(inner)) => {
                let outer_binds_tighter = outer.op == crate::SetOperator::Intersect
                    && inner.op != crate::SetOperator::Intersect;
                right || outer_binds_tighter || self.has_tail(operand)
            }
            (_, NodeKind::Select(_)) => self.has_tail(operand),
            _ => false,
        };
        self.write_wrapped(operand, parens, out);
    }

    /// Whether a query carries a WITH, ORDER BY or OFFSET clause
    fn has_tail(&self, query: NodeId) -> bool {
        let children = self.children(query);
        match self.kind(query) {
            NodeKind::Select(q) => {
                q.offset.is_some()
                    || !self.children(children[0]).is_empty()
                    || !self.children(children[6]).is_empty()
            }
            NodeKind::SetOperation(s) => {
                s.offset.is_some()
                    || !self.children(children[0]).is_empty()
                    || !self.children(children[3]).is_empty()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_adql())
    }
}
