//! Value expressions and function calls

use crate::parser::{PResult, Parser};
use crate::token::{Keyword, Token, TokenKind};
use adql_ast::{
    AdqlVersion, Aggregate, AggregateFunction, CAST, COALESCE, CastType, ColumnName, ColumnRef,
    ExpectedType, Geometry, GeometryFunction, IN_UNIT, LOWER, MathFunction, NodeId, NodeKind,
    NumericLiteral, Operator, StringFunction, StringLiteral, UPPER, UnaryOperator, UserFunction,
};
use adql_diagnostics::{
    ADQL0011, ADQL0012, ADQL0101, ParseError, PositionedError, SyntaxError, TextPosition,
};

const OPERAND_START: &[&str] = &["<identifier>", "<number>", "<string>", "(", "-", "+"];

const CAST_TYPES: &[&str] = &[
    "SMALLINT",
    "INTEGER",
    "BIGINT",
    "REAL",
    "DOUBLE PRECISION",
    "CHAR",
    "VARCHAR",
    "TIMESTAMP",
];

impl Parser<'_, '_> {
    /// Any value expression
    pub(crate) fn operand(&mut self) -> PResult<NodeId> {
        self.concatenation()
    }

    fn concatenation(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let first = self.bitwise()?;
        if !self.check(TokenKind::Concat) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat(TokenKind::Concat) {
            parts.push(self.bitwise()?);
        }
        for &part in &parts {
            self.require(part, ExpectedType::String)?;
        }
        let id = self.ast.add(NodeKind::Concatenation, parts);
        Ok(self.finish(id, start))
    }

    fn bitwise(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.additive()?;
        if self.version < AdqlVersion::V2_1 {
            return Ok(left);
        }
        loop {
            let op = match self.peek() {
                TokenKind::Ampersand => Operator::BitAnd,
                TokenKind::Pipe => Operator::BitOr,
                TokenKind::Caret => Operator::BitXor,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = self.binary(op, left, right, start)?;
        }
    }

    fn additive(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = self.binary(op, left, right, start)?;
        }
    }

    fn multiplicative(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Asterisk => Operator::Multiply,
                TokenKind::Slash => Operator::Divide,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = self.binary(op, left, right, start)?;
        }
    }

    fn binary(
        &mut self,
        op: Operator,
        left: NodeId,
        right: NodeId,
        start: TextPosition,
    ) -> PResult<NodeId> {
        self.require(left, ExpectedType::Numeric)?;
        self.require(right, ExpectedType::Numeric)?;
        let id = self.ast.add(NodeKind::Operation(op), [left, right]);
        Ok(self.finish(id, start))
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let op = match self.peek() {
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Tilde if self.version >= AdqlVersion::V2_1 => UnaryOperator::BitNot,
            _ => return self.primary(),
        };
        self.advance();
        let operand = self.unary()?;
        self.require(operand, ExpectedType::Numeric)?;
        let id = self.ast.add(NodeKind::Unary(op), [operand]);
        Ok(self.finish(id, start))
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let token = *self.current();
        let id = match token.kind {
            TokenKind::Number(kind) => {
                self.advance();
                self.ast
                    .leaf(NodeKind::Numeric(NumericLiteral::new(token.image, kind)))
            }
            TokenKind::String => {
                // Adjacent literals form one string
                let mut value = String::new();
                while self.check(TokenKind::String) {
                    value.push_str(&self.advance().string_value());
                }
                self.ast.leaf(NodeKind::Text(StringLiteral::new(value)))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.operand()?;
                self.expect_token(TokenKind::RightParen)?;
                self.ast.add(NodeKind::Wrapped, [inner])
            }
            TokenKind::Keyword(keyword)
                if keyword.is_function() && self.peek_nth(1) == TokenKind::LeftParen =>
            {
                return self.function_call(keyword);
            }
            TokenKind::Identifier if self.peek_nth(1) == TokenKind::LeftParen => {
                return self.user_function();
            }
            TokenKind::Identifier | TokenKind::DelimitedIdentifier | TokenKind::SqlReserved => {
                let parts = self.qualified_parts(4)?;
                let name = ColumnName::from_parts(parts)
                    .ok_or_else(|| self.unexpected(&["<identifier>"]))?;
                self.ast.leaf(NodeKind::Column(ColumnRef::new(name)))
            }
            // Function name used as a column name
            TokenKind::Keyword(keyword) if keyword.is_function() => {
                self.identifier()?;
                return Err(self.unexpected(OPERAND_START));
            }
            _ => return Err(self.unexpected(OPERAND_START)),
        };
        Ok(self.finish(id, start))
    }

    /// Fail unless `id` may be of the `expected` type. A column reference
    /// whose type is still unknown remembers what was expected of it.
    pub(crate) fn require(&mut self, id: NodeId, expected: ExpectedType) -> PResult<()> {
        if !self.ast.value_types(id).allows(expected) {
            let found = self.ast.render(id);
            let what = match expected {
                ExpectedType::Numeric => "A numeric",
                ExpectedType::String => "A string",
                ExpectedType::Geometry => "A geometry",
            };
            let mut error = SyntaxError::new(
                ADQL0012,
                format!("Type mismatch! {what} value was expected instead of \"{found}\"."),
                self.ast.position(id).unwrap_or_else(|| self.last_position()),
            );
            error.found = Some(found);
            return Err(error.into());
        }
        if let NodeKind::Column(column) = self.ast.kind_mut(id) {
            column.expected.get_or_insert(expected);
        }
        Ok(())
    }

    // === Function calls ===

    /// `( [operand {, operand}] )`
    fn arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect_token(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RightParen) {
            return Ok(args);
        }
        args.push(self.operand()?);
        while self.eat(TokenKind::Comma) {
            args.push(self.operand()?);
        }
        self.expect_token(TokenKind::RightParen)?;
        Ok(args)
    }

    fn arity_error(&self, name: &Token<'_>, expected: &str, found: usize) -> ParseError {
        let position = name.position.merge(self.last_position());
        SyntaxError::new(
            ADQL0011,
            format!(
                "Wrong number of arguments for {}: expected {expected}, found {found}",
                name.image.to_ascii_uppercase()
            ),
            position,
        )
        .into()
    }

    fn function_call(&mut self, keyword: Keyword) -> PResult<NodeId> {
        let start = self.start();
        let name = self.advance();
        let word = keyword.as_str();
        let id = if let Some(function) = AggregateFunction::from_name(word) {
            self.aggregate(function)?
        } else if let Some(function) = MathFunction::from_name(word) {
            self.math(function, &name)?
        } else if let Some(function) = GeometryFunction::from_name(word) {
            self.gate(function.feature(), name.position);
            self.geometry(function, &name)?
        } else if let Some(function) = StringFunction::from_name(word) {
            let feature = match function {
                StringFunction::Lower => &LOWER,
                StringFunction::Upper => &UPPER,
            };
            self.gate(feature, name.position);
            let args = self.arguments()?;
            if args.len() != 1 {
                return Err(self.arity_error(&name, "1", args.len()));
            }
            self.require(args[0], ExpectedType::String)?;
            self.ast.add(NodeKind::StringFunction(function), args)
        } else {
            match keyword {
                Keyword::Coalesce => {
                    self.gate(&COALESCE, name.position);
                    let args = self.arguments()?;
                    if args.is_empty() {
                        return Err(self.arity_error(&name, "at least 1", 0));
                    }
                    self.ast.add(NodeKind::Coalesce, args)
                }
                Keyword::Cast => {
                    self.gate(&CAST, name.position);
                    self.cast()?
                }
                Keyword::InUnit => {
                    self.gate(&IN_UNIT, name.position);
                    let args = self.arguments()?;
                    if args.len() != 2 {
                        return Err(self.arity_error(&name, "2", args.len()));
                    }
                    self.require(args[0], ExpectedType::Numeric)?;
                    self.require(args[1], ExpectedType::String)?;
                    self.ast.add(NodeKind::InUnit, args)
                }
                _ => return Err(self.unexpected(OPERAND_START)),
            }
        };
        Ok(self.finish(id, start))
    }

    fn aggregate(&mut self, function: AggregateFunction) -> PResult<NodeId> {
        self.expect_token(TokenKind::LeftParen)?;
        if function == AggregateFunction::Count && self.eat(TokenKind::Asterisk) {
            self.expect_token(TokenKind::RightParen)?;
            return Ok(self.ast.leaf(NodeKind::Aggregate(Aggregate {
                function,
                distinct: false,
            })));
        }
        let distinct = self.eat_kw(Keyword::Distinct);
        if !distinct {
            self.eat_kw(Keyword::All);
        }
        let arg = self.operand()?;
        self.expect_token(TokenKind::RightParen)?;
        if matches!(function, AggregateFunction::Avg | AggregateFunction::Sum) {
            self.require(arg, ExpectedType::Numeric)?;
        }
        Ok(self
            .ast
            .add(NodeKind::Aggregate(Aggregate { function, distinct }), [arg]))
    }

    fn math(&mut self, function: MathFunction, name: &Token<'_>) -> PResult<NodeId> {
        let args = self.arguments()?;
        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(self.arity_error(name, &expected, args.len()));
        }
        for &arg in &args {
            self.require(arg, ExpectedType::Numeric)?;
        }
        Ok(self.ast.add(NodeKind::Math(function), args))
    }

    /// Geometry call. POINT, CIRCLE, BOX and POLYGON may start with a
    /// coordinate system string, which 2.0 requires.
    fn geometry(&mut self, function: GeometryFunction, name: &Token<'_>) -> PResult<NodeId> {
        let args = self.arguments()?;
        let takes_coord_sys = matches!(
            function,
            GeometryFunction::Point
                | GeometryFunction::Circle
                | GeometryFunction::Box
                | GeometryFunction::Polygon
        );
        let coord_sys = takes_coord_sys
            && match self.version {
                AdqlVersion::V2_0 => !args.is_empty(),
                AdqlVersion::V2_1 => args.first().is_some_and(|&first| {
                    let types = self.ast.value_types(first);
                    types.string && !types.numeric && !types.geometry
                }),
            };
        let shape_args = if coord_sys { &args[1..] } else { &args[..] };
        let Some(shape) = self.geometry_shape(function, shape_args) else {
            let expected = match (function, self.version) {
                (GeometryFunction::Point, AdqlVersion::V2_0) => "3",
                (GeometryFunction::Circle, AdqlVersion::V2_0) => "4",
                (GeometryFunction::Box, AdqlVersion::V2_0) => "5",
                (GeometryFunction::Polygon, AdqlVersion::V2_0) => "7 or more",
                (GeometryFunction::Point, _) => "2 or 3",
                (GeometryFunction::Circle, _) => "2 to 4",
                (GeometryFunction::Box, _) => "3 to 5",
                (GeometryFunction::Polygon, _) => "3 or more",
                (GeometryFunction::Distance, AdqlVersion::V2_1) => "2 or 4",
                (GeometryFunction::Contains | GeometryFunction::Intersects, _) => "2",
                (GeometryFunction::Distance, _) => "2",
                _ => "1",
            };
            return Err(self.arity_error(name, expected, args.len()));
        };
        if coord_sys {
            self.require(args[0], ExpectedType::String)?;
        }
        for (&arg, expected) in shape_args.iter().zip(shape) {
            self.require(arg, expected)?;
        }
        Ok(self
            .ast
            .add(NodeKind::Geometry(Geometry { function, coord_sys }), args))
    }

    /// Expected argument types of a geometry call, without the coordinate
    /// system; `None` for a wrong argument count
    fn geometry_shape(
        &self,
        function: GeometryFunction,
        args: &[NodeId],
    ) -> Option<Vec<ExpectedType>> {
        use ExpectedType::{Geometry as G, Numeric as N, String as S};
        let n = args.len();
        let v2_1 = self.version >= AdqlVersion::V2_1;
        match function {
            GeometryFunction::Point => (n == 2).then(|| vec![N, N]),
            GeometryFunction::Circle => match n {
                3 => Some(vec![N, N, N]),
                2 if v2_1 => Some(vec![G, N]),
                _ => None,
            },
            GeometryFunction::Box => match n {
                4 => Some(vec![N; 4]),
                3 if v2_1 => Some(vec![G, N, N]),
                _ => None,
            },
            GeometryFunction::Polygon => {
                let first_is_point = args.first().is_some_and(|&a| !self.ast.is_numeric(a));
                if v2_1 && n >= 3 && (n % 2 == 1 || n < 6 || first_is_point) {
                    Some(vec![G; n])
                } else if n >= 6 && n % 2 == 0 {
                    Some(vec![N; n])
                } else {
                    None
                }
            }
            GeometryFunction::Region => (n == 1).then(|| vec![S]),
            GeometryFunction::Centroid
            | GeometryFunction::Area
            | GeometryFunction::Coord1
            | GeometryFunction::Coord2
            | GeometryFunction::CoordSys => (n == 1).then(|| vec![G]),
            GeometryFunction::Distance => match n {
                2 => Some(vec![G, G]),
                4 if v2_1 => Some(vec![N; 4]),
                _ => None,
            },
            GeometryFunction::Contains | GeometryFunction::Intersects => {
                (n == 2).then(|| vec![G, G])
            }
        }
    }

    /// `(operand AS type)`
    fn cast(&mut self) -> PResult<NodeId> {
        self.expect_token(TokenKind::LeftParen)?;
        let value = self.operand()?;
        self.expect_kw(Keyword::As)?;
        let target = self.cast_type()?;
        self.expect_token(TokenKind::RightParen)?;
        Ok(self.ast.add(NodeKind::Cast(target), [value]))
    }

    fn cast_type(&mut self) -> PResult<CastType> {
        let token = *self.current();
        if !matches!(token.kind, TokenKind::Identifier | TokenKind::SqlReserved) {
            return Err(self.unexpected(CAST_TYPES));
        }
        let target = match token.image.to_ascii_uppercase().as_str() {
            "SMALLINT" => CastType::Smallint,
            "INTEGER" => CastType::Integer,
            "BIGINT" => CastType::Bigint,
            "REAL" => CastType::Real,
            "TIMESTAMP" => CastType::Timestamp,
            "DOUBLE" => {
                self.advance();
                let precision = *self.current();
                if precision.kind != TokenKind::SqlReserved
                    || !precision.image.eq_ignore_ascii_case("PRECISION")
                {
                    return Err(self.unexpected(&["PRECISION"]));
                }
                CastType::DoublePrecision
            }
            "CHAR" => {
                self.advance();
                return Ok(CastType::Char(self.type_length()?));
            }
            "VARCHAR" => {
                self.advance();
                return Ok(CastType::Varchar(self.type_length()?));
            }
            _ => return Err(self.unexpected(CAST_TYPES)),
        };
        self.advance();
        Ok(target)
    }

    /// Optional `(n)` after CHAR / VARCHAR
    fn type_length(&mut self) -> PResult<Option<u32>> {
        if !self.eat(TokenKind::LeftParen) {
            return Ok(None);
        }
        let token = *self.current();
        let length = self.unsigned_integer()?;
        let length = u32::try_from(length).map_err(|_| {
            self.error_at(&token, ADQL0012, format!("Type length too large: {length}"))
        })?;
        self.expect_token(TokenKind::RightParen)?;
        Ok(Some(length))
    }

    /// Call of a function that is not part of the language
    fn user_function(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let name = self.identifier()?;
        let args = self.arguments()?;
        let mut call = UserFunction::new(name.name);
        let features = self.features;
        match features.find_udf(&call.name, args.len()) {
            Some(definition) => {
                for (&arg, param) in args.iter().zip(&definition.params) {
                    let expected = if param.datatype.is_numeric() {
                        ExpectedType::Numeric
                    } else if param.datatype.is_string() {
                        ExpectedType::String
                    } else if param.datatype.is_geometry() {
                        ExpectedType::Geometry
                    } else {
                        continue;
                    };
                    self.require(arg, expected)?;
                }
                call.definition = Some(definition.clone());
            }
            None if !features.allows_any_udf() => {
                let rendered: Vec<_> = args.iter().map(|&arg| self.ast.render(arg)).collect();
                let params: Vec<_> = (1..=args.len()).map(|i| format!("param{i}")).collect();
                let message = format!(
                    "Unresolved function: \"{}({})\"! No UDF has been defined or found with the signature: {}({})",
                    call.name,
                    rendered.join(", "),
                    call.name,
                    params.join(", ")
                );
                let position = start.merge(self.last_position());
                self.unresolved(PositionedError::new(ADQL0101, message, Some(position)));
            }
            None => {}
        }
        let id = self.ast.add(NodeKind::UserFunction(call), args);
        Ok(self.finish(id, start))
    }
}
