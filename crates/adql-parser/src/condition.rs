//! Search conditions: WHERE, HAVING and ON bodies

use crate::parser::{PResult, Parser};
use crate::token::{Keyword, TokenKind};
use adql_ast::{
    AdqlVersion, ComparisonOperator, Connector, Constraints, ExpectedType, ILIKE, NodeId,
    NodeKind, ValueTypes,
};
use adql_diagnostics::{ADQL0012, SyntaxError};

impl Parser<'_, '_> {
    /// `condition {(AND | OR) condition}`, as one flat constraint list
    pub(crate) fn condition_list(&mut self, group: bool) -> PResult<NodeId> {
        let start = self.start();
        let mut items = vec![self.condition_factor()?];
        let mut connectors = vec![Connector::And];
        loop {
            let connector = match self.peek() {
                TokenKind::Keyword(Keyword::And) => Connector::And,
                TokenKind::Keyword(Keyword::Or) => Connector::Or,
                _ => break,
            };
            self.advance();
            connectors.push(connector);
            items.push(self.condition_factor()?);
        }
        let id = self
            .ast
            .add(NodeKind::Constraints(Constraints { connectors, group }), items);
        Ok(self.finish(id, start))
    }

    fn condition_factor(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.eat_kw(Keyword::Not) {
            let inner = self.condition_factor()?;
            let id = self.ast.add(NodeKind::Not, [inner]);
            return Ok(self.finish(id, start));
        }
        if !self.check(TokenKind::LeftParen) {
            return self.predicate();
        }

        // A parenthesis opens either a group of conditions or an operand
        let checkpoint = self.checkpoint();
        self.advance();
        let group = self.condition_list(true).and_then(|group| {
            self.expect_token(TokenKind::RightParen)?;
            Ok(group)
        });
        match group {
            Ok(group) => Ok(self.finish(group, start)),
            Err(group_error) => {
                self.rewind(checkpoint);
                self.predicate()
                    .map_err(|error| Self::furthest(group_error, error))
            }
        }
    }

    fn predicate(&mut self) -> PResult<NodeId> {
        let start = self.start();
        if self.eat_kw(Keyword::Exists) {
            let query = self.subquery()?;
            let id = self.ast.add(NodeKind::Exists, [query]);
            return Ok(self.finish(id, start));
        }

        let left = self.operand()?;
        let negated = self.eat_kw(Keyword::Not);
        let comparison = comparison_operator(self.peek()).filter(|_| !negated);
        let id = match (self.peek(), comparison) {
            (_, Some(op)) => {
                let token = self.advance();
                let right = self.operand()?;
                let common = self.ast.value_types(left).intersect(self.ast.value_types(right));
                if common == ValueTypes::NONE {
                    return Err(SyntaxError::new(
                        ADQL0012,
                        format!(
                            "Type mismatch! The operands of \"{}\" must have compatible types",
                            token.image
                        ),
                        start.merge(self.last_position()),
                    )
                    .into());
                }
                self.ast.add(NodeKind::Comparison(op), [left, right])
            }
            (TokenKind::Keyword(Keyword::Between), _) => {
                self.advance();
                let low = self.operand()?;
                self.expect_kw(Keyword::And)?;
                let high = self.operand()?;
                self.ast
                    .add(NodeKind::Between { negated }, [left, low, high])
            }
            (TokenKind::Keyword(Keyword::In), _) => {
                self.advance();
                let values = self.in_values()?;
                self.ast.add(NodeKind::In { negated }, [left, values])
            }
            (TokenKind::Keyword(keyword @ (Keyword::Like | Keyword::Ilike)), _) => {
                let token = self.advance();
                let case_insensitive = keyword == Keyword::Ilike;
                if case_insensitive {
                    self.gate(&ILIKE, token.position);
                }
                let pattern = self.operand()?;
                self.require(left, ExpectedType::String)?;
                self.require(pattern, ExpectedType::String)?;
                self.ast.add(
                    NodeKind::Like {
                        negated,
                        case_insensitive,
                    },
                    [left, pattern],
                )
            }
            (TokenKind::Keyword(Keyword::Is), _) if !negated => {
                self.advance();
                let negated = self.eat_kw(Keyword::Not);
                self.expect_kw(Keyword::Null)?;
                self.ast.add(NodeKind::IsNull { negated }, [left])
            }
            _ => return Err(self.unexpected(&self.predicate_continuations(negated))),
        };
        Ok(self.finish(id, start))
    }

    /// Right side of IN: a subquery or a value list
    fn in_values(&mut self) -> PResult<NodeId> {
        let looks_like_query = matches!(
            self.peek_nth(1),
            TokenKind::Keyword(Keyword::Select | Keyword::With) | TokenKind::LeftParen
        );
        let mut query_error = None;
        if looks_like_query {
            let checkpoint = self.checkpoint();
            match self.subquery() {
                Ok(query) => return Ok(query),
                Err(error) => {
                    self.rewind(checkpoint);
                    query_error = Some(error);
                }
            }
        }

        let start = self.start();
        let list = self.expect_token(TokenKind::LeftParen).and_then(|_| {
            let mut values = vec![self.operand()?];
            while self.eat(TokenKind::Comma) {
                values.push(self.operand()?);
            }
            self.expect_token(TokenKind::RightParen)?;
            Ok(values)
        });
        match (list, query_error) {
            (Ok(values), _) => {
                let id = self.ast.add(NodeKind::OperandList, values);
                Ok(self.finish(id, start))
            }
            (Err(error), Some(previous)) => Err(Self::furthest(previous, error)),
            (Err(error), None) => Err(error),
        }
    }

    fn predicate_continuations(&self, negated: bool) -> Vec<&'static str> {
        let mut expected = Vec::new();
        if !negated {
            expected.extend(["=", "<>", "<", "<=", ">", ">="]);
        }
        expected.extend(["BETWEEN", "IN", "LIKE"]);
        if self.version >= AdqlVersion::V2_1 {
            expected.push("ILIKE");
        }
        if !negated {
            expected.extend(["IS", "NOT"]);
        }
        expected
    }
}

fn comparison_operator(kind: TokenKind) -> Option<ComparisonOperator> {
    match kind {
        TokenKind::Equal => Some(ComparisonOperator::Equal),
        TokenKind::NotEqual => Some(ComparisonOperator::NotEqual),
        TokenKind::Less => Some(ComparisonOperator::Less),
        TokenKind::LessEqual => Some(ComparisonOperator::LessOrEqual),
        TokenKind::Greater => Some(ComparisonOperator::Greater),
        TokenKind::GreaterEqual => Some(ComparisonOperator::GreaterOrEqual),
        _ => None,
    }
}
