//! Queries, set operations and clauses

use crate::parser::{PResult, Parser};
use crate::token::{Keyword, TokenKind};
use adql_ast::{
    ColumnName, ColumnRef, Constraints, Identifier, Join, JoinKind, NodeId, NodeKind,
    NumericLiteral, OFFSET, OrderItem, SelectAll, SelectClause, SelectItem, SelectQuery,
    SetOperation, SetOperator, SubqueryTable, TableName, TableRef, WITH, WithItem,
};
use adql_diagnostics::{ADQL0001, ADQL0014, SyntaxError, TextPosition};

const ORDER_BY_NEXT: &[&str] = &[",", "ASC", "DESC"];
const GROUP_BY_NEXT: &[&str] = &[",", "HAVING", "ORDER"];
const USING_NEXT: &[&str] = &[",", ")"];

impl Parser<'_, '_> {
    /// `[WITH ...] set_expr [ORDER BY ...] [OFFSET n]`
    pub(crate) fn query_expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let with = self.with_clause()?;
        let query = self.set_expression()?;

        let order_start = self.start();
        let order_by = if self.check_kw(Keyword::Order) {
            Some(self.order_by_clause()?)
        } else {
            None
        };
        let offset = self.offset_clause()?;

        if with.is_some() || order_by.is_some() || offset.is_some() {
            self.attach_tail(query, with, order_by, offset, order_start)?;
        }
        Ok(self.finish(query, start))
    }

    /// Put WITH, ORDER BY and OFFSET on the outermost query node
    fn attach_tail(
        &mut self,
        query: NodeId,
        with: Option<NodeId>,
        order_by: Option<NodeId>,
        offset: Option<u64>,
        order_start: TextPosition,
    ) -> PResult<()> {
        let (order_index, existing_offset) = match self.ast.kind(query) {
            NodeKind::Select(q) => (6, q.offset),
            NodeKind::SetOperation(s) => (3, s.offset),
            _ => return Err(self.unexpected(&["SELECT"])),
        };
        let children = self.ast.children(query).to_vec();
        let has_order = !self.ast.children(children[order_index]).is_empty();
        let has_with = !self.ast.children(children[0]).is_empty();
        let second_tail =
            (order_by.is_some() || offset.is_some()) && (has_order || existing_offset.is_some());
        if second_tail || (with.is_some() && has_with) {
            return Err(SyntaxError::new(
                ADQL0001,
                "A parenthesised query cannot be followed by a second ORDER BY, OFFSET or WITH",
                order_start,
            )
            .into());
        }

        let mut cursor = self.ast.cursor(query);
        let mut index = 0;
        while cursor.next(&self.ast).is_some() {
            let replacement = match index {
                0 => with,
                i if i == order_index => order_by,
                _ => None,
            };
            if let Some(replacement) = replacement {
                cursor
                    .replace(&mut self.ast, replacement)
                    .map_err(|e| self.tree_error(e))?;
            }
            index += 1;
        }
        match self.ast.kind_mut(query) {
            NodeKind::Select(q) if offset.is_some() => q.offset = offset,
            NodeKind::SetOperation(s) if offset.is_some() => s.offset = offset,
            _ => {}
        }
        Ok(())
    }

    /// `term {(UNION | EXCEPT) [ALL] term}`
    fn set_expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.set_term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Keyword(Keyword::Union) => SetOperator::Union,
                TokenKind::Keyword(Keyword::Except) => SetOperator::Except,
                _ => return Ok(left),
            };
            let token = self.advance();
            self.gate(op.feature(), token.position);
            let all = self.eat_kw(Keyword::All);
            let right = self.set_term()?;
            left = self.set_operation(op, all, left, right, start);
        }
    }

    /// `primary {INTERSECT [ALL] primary}`
    fn set_term(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.query_primary()?;
        while self.check_kw(Keyword::Intersect) {
            let token = self.advance();
            self.gate(SetOperator::Intersect.feature(), token.position);
            let all = self.eat_kw(Keyword::All);
            let right = self.query_primary()?;
            left = self.set_operation(SetOperator::Intersect, all, left, right, start);
        }
        Ok(left)
    }

    fn set_operation(
        &mut self,
        op: SetOperator,
        all: bool,
        left: NodeId,
        right: NodeId,
        start: TextPosition,
    ) -> NodeId {
        let with = self.ast.leaf(NodeKind::With);
        let order_by = self.ast.leaf(NodeKind::OrderBy);
        let id = self.ast.add(
            NodeKind::SetOperation(SetOperation {
                op,
                all,
                offset: None,
            }),
            [with, left, right, order_by],
        );
        self.finish(id, start)
    }

    fn query_primary(&mut self) -> PResult<NodeId> {
        if self.eat(TokenKind::LeftParen) {
            let query = self.query_expression()?;
            self.expect_token(TokenKind::RightParen)?;
            return Ok(query);
        }
        self.select_query()
    }

    /// Subquery between parentheses
    pub(crate) fn subquery(&mut self) -> PResult<NodeId> {
        self.expect_token(TokenKind::LeftParen)?;
        let query = self.query_expression()?;
        self.expect_token(TokenKind::RightParen)?;
        Ok(query)
    }

    /// `SELECT ... FROM ... [WHERE] [GROUP BY] [HAVING]`
    fn select_query(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let with = self.ast.leaf(NodeKind::With);
        let select = self.select_clause()?;
        if !self.check_kw(Keyword::From) {
            return Err(self.unexpected(&[",", "FROM"]));
        }
        let from = self.from_clause()?;
        let filter = if self.check_kw(Keyword::Where) {
            self.where_clause()?
        } else {
            self.ast.leaf(NodeKind::Constraints(Constraints::clause()))
        };
        let group_by = if self.check_kw(Keyword::Group) {
            self.group_by_clause()?
        } else {
            self.ast.leaf(NodeKind::GroupBy)
        };
        let having = if self.check_kw(Keyword::Having) {
            self.having_clause()?
        } else {
            self.ast.leaf(NodeKind::Constraints(Constraints::clause()))
        };
        let order_by = self.ast.leaf(NodeKind::OrderBy);
        let id = self.ast.add(
            NodeKind::Select(SelectQuery::default()),
            [with, select, from, filter, group_by, having, order_by],
        );
        Ok(self.finish(id, start))
    }

    // === WITH ===

    fn with_clause(&mut self) -> PResult<Option<NodeId>> {
        if !self.check_kw(Keyword::With) {
            return Ok(None);
        }
        let start = self.start();
        let token = self.advance();
        self.gate(&WITH, token.position);
        let mut items = vec![self.with_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.with_item()?);
        }
        let id = self.ast.add(NodeKind::With, items);
        Ok(Some(self.finish(id, start)))
    }

    /// `label [(col, ...)] AS (query)`
    fn with_item(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let label = self.identifier()?;
        let mut columns = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            columns.push(self.identifier()?);
            while self.eat(TokenKind::Comma) {
                columns.push(self.identifier()?);
            }
            self.expect_token(TokenKind::RightParen)?;
        }
        self.expect_kw(Keyword::As)?;
        let query = self.subquery()?;
        let id = self
            .ast
            .add(NodeKind::WithItem(WithItem { label, columns }), [query]);
        Ok(self.finish(id, start))
    }

    // === SELECT ===

    pub(crate) fn select_clause(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect_kw(Keyword::Select)?;
        let mut clause = SelectClause::default();
        if self.eat_kw(Keyword::Distinct) {
            clause.distinct = true;
        } else {
            self.eat_kw(Keyword::All);
        }
        if self.eat_kw(Keyword::Top) {
            clause.top = Some(self.unsigned_integer()?);
        }
        let mut items = vec![self.select_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.select_item()?);
        }
        let id = self.ast.add(NodeKind::SelectClause(clause), items);
        Ok(self.finish(id, start))
    }

    fn select_item(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.eat(TokenKind::Asterisk) {
            let id = self.ast.leaf(NodeKind::SelectAll(SelectAll::default()));
            return Ok(self.finish(id, start));
        }
        if self.at_table_wildcard() {
            let parts = self.qualified_parts(3)?;
            self.expect_token(TokenKind::Dot)?;
            self.expect_token(TokenKind::Asterisk)?;
            let table = TableName::from_parts(parts);
            let id = self.ast.leaf(NodeKind::SelectAll(SelectAll { table }));
            return Ok(self.finish(id, start));
        }
        let operand = self.operand()?;
        let alias = self.alias()?;
        let id = self
            .ast
            .add(NodeKind::SelectItem(SelectItem { alias }), [operand]);
        Ok(self.finish(id, start))
    }

    /// `ident {. ident} . *` ahead
    fn at_table_wildcard(&self) -> bool {
        let mut n = 0;
        loop {
            if !matches!(
                self.peek_nth(n),
                TokenKind::Identifier | TokenKind::DelimitedIdentifier | TokenKind::SqlReserved
            ) || self.peek_nth(n + 1) != TokenKind::Dot
            {
                return false;
            }
            if self.peek_nth(n + 2) == TokenKind::Asterisk {
                return true;
            }
            n += 2;
        }
    }

    // === FROM ===

    pub(crate) fn from_clause(&mut self) -> PResult<NodeId> {
        self.expect_kw(Keyword::From)?;
        self.table_list()
    }

    /// Comma separated FROM items, folded into cross joins
    fn table_list(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.joined_table()?;
        while self.eat(TokenKind::Comma) {
            let right = self.joined_table()?;
            let on = self.ast.leaf(NodeKind::Constraints(Constraints::clause()));
            let join = Join {
                kind: JoinKind::Cross,
                natural: false,
                using: Vec::new(),
            };
            let id = self.ast.add(NodeKind::Join(join), [left, right, on]);
            left = self.finish(id, start);
        }
        Ok(left)
    }

    fn joined_table(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.table_primary()?;
        loop {
            let natural = self.eat_kw(Keyword::Natural);
            let kind = match self.peek() {
                TokenKind::Keyword(Keyword::Join) => JoinKind::Inner,
                TokenKind::Keyword(Keyword::Inner) => {
                    self.advance();
                    JoinKind::Inner
                }
                TokenKind::Keyword(Keyword::Left) => {
                    self.advance();
                    self.eat_kw(Keyword::Outer);
                    JoinKind::LeftOuter
                }
                TokenKind::Keyword(Keyword::Right) => {
                    self.advance();
                    self.eat_kw(Keyword::Outer);
                    JoinKind::RightOuter
                }
                TokenKind::Keyword(Keyword::Full) => {
                    self.advance();
                    self.eat_kw(Keyword::Outer);
                    JoinKind::FullOuter
                }
                _ if natural => {
                    return Err(self.unexpected(&["INNER", "LEFT", "RIGHT", "FULL", "JOIN"]));
                }
                _ => return Ok(left),
            };
            self.expect_kw(Keyword::Join)?;
            let right = self.table_primary()?;

            let mut join = Join {
                kind,
                natural,
                using: Vec::new(),
            };
            let on = if natural {
                self.ast.leaf(NodeKind::Constraints(Constraints::clause()))
            } else if self.eat_kw(Keyword::On) {
                self.condition_list(false)?
            } else if self.eat_kw(Keyword::Using) {
                join.using = self.using_columns()?;
                self.ast.leaf(NodeKind::Constraints(Constraints::clause()))
            } else {
                return Err(self.unexpected(&["ON", "USING"]));
            };
            let id = self.ast.add(NodeKind::Join(join), [left, right, on]);
            left = self.finish(id, start);
        }
    }

    fn using_columns(&mut self) -> PResult<Vec<Identifier>> {
        self.expect_token(TokenKind::LeftParen)?;
        let mut columns = Vec::new();
        loop {
            self.reject_qualified(USING_NEXT)?;
            columns.push(self.identifier()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(TokenKind::RightParen)?;
        Ok(columns)
    }

    fn table_primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if !self.check(TokenKind::LeftParen) {
            let parts = self.qualified_parts(3)?;
            let name = TableName::from_parts(parts).ok_or_else(|| self.unexpected(&["<table>"]))?;
            let alias = self.alias()?;
            let id = self.ast.leaf(NodeKind::Table(TableRef { name, alias }));
            return Ok(self.finish(id, start));
        }

        let looks_like_query = matches!(
            self.peek_nth(1),
            TokenKind::Keyword(Keyword::Select | Keyword::With) | TokenKind::LeftParen
        );
        let checkpoint = self.checkpoint();
        let subquery_error = if looks_like_query {
            match self.subquery_table(start) {
                Ok(id) => return Ok(id),
                Err(error) => {
                    self.rewind(checkpoint);
                    Some(error)
                }
            }
        } else {
            None
        };

        let joined = self.expect_token(TokenKind::LeftParen).and_then(|_| {
            let inner = self.table_list()?;
            self.expect_token(TokenKind::RightParen)?;
            Ok(inner)
        });
        match (joined, subquery_error) {
            (Ok(id), _) => Ok(id),
            (Err(error), Some(previous)) => Err(Self::furthest(previous, error)),
            (Err(error), None) => Err(error),
        }
    }

    fn subquery_table(&mut self, start: TextPosition) -> PResult<NodeId> {
        let query = self.subquery()?;
        let alias = match self.alias()? {
            Some(alias) => alias,
            None => {
                return Err(SyntaxError::new(
                    ADQL0014,
                    "A subquery in FROM must have an alias: (SELECT ...) AS alias",
                    self.start(),
                )
                .into());
            }
        };
        let id = self
            .ast
            .add(NodeKind::SubqueryTable(SubqueryTable { alias }), [query]);
        Ok(self.finish(id, start))
    }

    // === WHERE, GROUP BY, HAVING, ORDER BY, OFFSET ===

    pub(crate) fn where_clause(&mut self) -> PResult<NodeId> {
        self.expect_kw(Keyword::Where)?;
        self.condition_list(false)
    }

    pub(crate) fn having_clause(&mut self) -> PResult<NodeId> {
        self.expect_kw(Keyword::Having)?;
        self.condition_list(false)
    }

    pub(crate) fn group_by_clause(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect_kw(Keyword::Group)?;
        self.expect_kw(Keyword::By)?;
        let mut items = vec![self.sort_key(GROUP_BY_NEXT)?];
        while self.eat(TokenKind::Comma) {
            items.push(self.sort_key(GROUP_BY_NEXT)?);
        }
        let id = self.ast.add(NodeKind::GroupBy, items);
        Ok(self.finish(id, start))
    }

    pub(crate) fn order_by_clause(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect_kw(Keyword::Order)?;
        self.expect_kw(Keyword::By)?;
        let mut items = vec![self.order_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.order_item()?);
        }
        let id = self.ast.add(NodeKind::OrderBy, items);
        Ok(self.finish(id, start))
    }

    fn order_item(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let key = self.sort_key(ORDER_BY_NEXT)?;
        let descending = if self.eat_kw(Keyword::Desc) {
            true
        } else {
            self.eat_kw(Keyword::Asc);
            false
        };
        let id = self
            .ast
            .add(NodeKind::OrderItem(OrderItem { descending }), [key]);
        Ok(self.finish(id, start))
    }

    /// Item of GROUP BY / ORDER BY: never a qualified name; in 2.0 only a
    /// column name or a select-list index
    fn sort_key(&mut self, next: &[&str]) -> PResult<NodeId> {
        self.reject_qualified(next)?;
        if self.version >= adql_ast::AdqlVersion::V2_1 {
            return self.operand();
        }
        let start = self.start();
        let id = match self.peek() {
            TokenKind::Number(adql_ast::NumberKind::Integer) => {
                let token = self.advance();
                self.ast.leaf(NodeKind::Numeric(NumericLiteral::new(
                    token.image,
                    adql_ast::NumberKind::Integer,
                )))
            }
            _ if self.at_identifier() => {
                let name = ColumnName::new(self.identifier()?);
                self.ast.leaf(NodeKind::Column(ColumnRef::new(name)))
            }
            _ => return Err(self.unexpected(&["<identifier>", "<unsigned integer>"])),
        };
        Ok(self.finish(id, start))
    }

    fn offset_clause(&mut self) -> PResult<Option<u64>> {
        if !self.check_kw(Keyword::Offset) {
            return Ok(None);
        }
        let token = self.advance();
        self.gate(&OFFSET, token.position);
        self.unsigned_integer().map(Some)
    }
}
