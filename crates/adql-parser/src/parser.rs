//! Parser state and token navigation
//!
//! The grammar itself lives in [`crate::query`], [`crate::condition`] and
//! [`crate::operand`] as further `impl Parser` blocks. Syntax errors stop the
//! parse; unsupported features are collected in `unresolved` and reported
//! once the whole input has been parsed.

use crate::lexer::Tokenizer;
use crate::token::{Keyword, Token, TokenKind, is_regular_identifier};
use adql_ast::{AdqlVersion, Ast, FeatureSet, Identifier, LanguageFeature, NodeId, TreeError};
use adql_diagnostics::{
    ADQL0008, ADQL0009, ADQL0013, ADQL0100, LexicalError, ParseError, ParseResult,
    PositionedError, Span, SyntaxError, TextPosition, UnresolvedError,
};

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Saved parser state for backtracking
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    pos: usize,
    unresolved: usize,
}

pub(crate) struct Parser<'a, 's> {
    tokens: Vec<Token<'s>>,
    pos: usize,
    pub(crate) version: AdqlVersion,
    pub(crate) features: &'a FeatureSet,
    pub(crate) ast: Ast,
    unresolved: Vec<PositionedError>,
    /// Error that cut the token stream short; the stream then ends with a
    /// synthetic `Eof` at the error position
    lex_error: Option<LexicalError>,
}

impl<'a, 's> Parser<'a, 's> {
    pub(crate) fn new(source: &'s str, version: AdqlVersion, features: &'a FeatureSet) -> Self {
        let mut tokenizer = Tokenizer::new(source, version);
        let mut tokens = Vec::new();
        let mut lex_error = None;
        loop {
            match tokenizer.next_token() {
                Ok(token) => {
                    let eof = token.is(TokenKind::Eof);
                    tokens.push(token);
                    if eof {
                        break;
                    }
                }
                Err(error) => {
                    let end = tokens.last().map_or(0, |t: &Token<'s>| t.span.end);
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        image: "",
                        span: Span::new(end, end),
                        position: error.position,
                        function_name: false,
                    });
                    lex_error = Some(error);
                    break;
                }
            }
        }
        Self {
            tokens,
            pos: 0,
            version,
            features,
            ast: Ast::new(),
            unresolved: Vec::new(),
            lex_error,
        }
    }

    /// Run one entry production over the whole input.
    ///
    /// The production must be followed by an optional `;` and the end of the
    /// input. Its node becomes the root of the returned tree.
    pub(crate) fn run(
        mut self,
        production: impl FnOnce(&mut Self) -> PResult<NodeId>,
    ) -> ParseResult<Ast> {
        let root = production(&mut self).and_then(|root| {
            self.eat(TokenKind::EndOfQuery);
            if !self.check(TokenKind::Eof) {
                return Err(self.unexpected(&["<EOF>"]));
            }
            Ok(root)
        })?;
        if !self.unresolved.is_empty() {
            log::debug!("{} unsupported feature(s) in query", self.unresolved.len());
            return Err(UnresolvedError::new(self.unresolved).into());
        }
        self.ast.set_root(root);
        Ok(self.ast)
    }

    // === Token navigation ===

    pub(crate) fn current(&self) -> &Token<'s> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn peek_nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn advance(&mut self) -> Token<'s> {
        let token = *self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn check_kw(&self, keyword: Keyword) -> bool {
        self.peek() == TokenKind::Keyword(keyword)
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_kw(&mut self, keyword: Keyword) -> bool {
        self.eat(TokenKind::Keyword(keyword))
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> PResult<Token<'s>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[kind.describe()]))
        }
    }

    pub(crate) fn expect_kw(&mut self, keyword: Keyword) -> PResult<Token<'s>> {
        self.expect_token(TokenKind::Keyword(keyword))
    }

    /// Position of the current token
    pub(crate) fn start(&self) -> TextPosition {
        self.current().position
    }

    /// Position of the last consumed token
    pub(crate) fn last_position(&self) -> TextPosition {
        match self.pos {
            0 => self.start(),
            n => self.tokens[n - 1].position,
        }
    }

    /// Give `id` the position running from `start` to the last consumed token
    pub(crate) fn finish(&mut self, id: NodeId, start: TextPosition) -> NodeId {
        let position = start.merge(self.last_position());
        self.ast.set_position(id, Some(position));
        id
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            unresolved: self.unresolved.len(),
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.unresolved.truncate(checkpoint.unresolved);
    }

    // === Errors ===

    /// "Encountered X. Was expecting ..." at the current token, or the
    /// lexical error that ended the token stream
    pub(crate) fn unexpected(&self, expected: &[&str]) -> ParseError {
        let token = self.current();
        if token.is(TokenKind::Eof) {
            if let Some(error) = &self.lex_error {
                return error.clone().into();
            }
            return SyntaxError::unexpected(None, expected, token.position).into();
        }
        SyntaxError::unexpected(Some(token.image), expected, token.position).into()
    }

    pub(crate) fn error_at(
        &self,
        token: &Token<'s>,
        code: adql_diagnostics::ErrorCode,
        message: impl Into<String>,
    ) -> ParseError {
        let mut error = SyntaxError::new(code, message, token.position);
        error.found = Some(token.image.to_string());
        error.into()
    }

    pub(crate) fn tree_error(&self, error: TreeError) -> ParseError {
        SyntaxError::new(error.code(), error.to_string(), self.last_position()).into()
    }

    /// Keep whichever error lies further in the input
    pub(crate) fn furthest(first: ParseError, second: ParseError) -> ParseError {
        let key = |e: &ParseError| e.position().map(|p| (p.begin_line, p.begin_column));
        if key(&second) > key(&first) { second } else { first }
    }

    /// Record an unsupported-feature error unless the feature is enabled
    pub(crate) fn gate(&mut self, feature: &LanguageFeature, position: TextPosition) {
        if self.features.is_supporting(feature) {
            return;
        }
        let message = match &feature.feature_type {
            Some(ty) => format!("Unsupported ADQL feature: \"{}\" (of type '{ty}')!", feature.form),
            None => format!("Unsupported ADQL feature: \"{}\"!", feature.form),
        };
        log::debug!("{message} at {position}");
        self.unresolved
            .push(PositionedError::new(ADQL0100, message, Some(position)));
    }

    pub(crate) fn unresolved(&mut self, error: PositionedError) {
        self.unresolved.push(error);
    }

    // === Identifiers ===

    /// Whether the current token can start an identifier
    pub(crate) fn at_identifier(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Identifier | TokenKind::DelimitedIdentifier | TokenKind::SqlReserved
        )
    }

    pub(crate) fn identifier(&mut self) -> PResult<Identifier> {
        let token = *self.current();
        match token.kind {
            TokenKind::Identifier if is_regular_identifier(token.image) => {
                self.advance();
                Ok(Identifier::regular(token.image))
            }
            TokenKind::Identifier => Err(self.error_at(
                &token,
                ADQL0009,
                format!(
                    "Invalid ADQL regular identifier: \"{}\"! If it is a column/table name, put it between double quotes: \"{}\"",
                    token.image, token.image
                ),
            )),
            TokenKind::DelimitedIdentifier => {
                self.advance();
                Ok(Identifier::delimited(token.identifier_value()))
            }
            TokenKind::SqlReserved => Err(self.reserved_error(&token, "SQL reserved word")),
            TokenKind::Keyword(k) if k.is_function() => {
                Err(self.reserved_error(&token, "ADQL function name"))
            }
            _ => Err(self.unexpected(&["<identifier>"])),
        }
    }

    fn reserved_error(&self, token: &Token<'s>, what: &str) -> ParseError {
        self.error_at(
            token,
            ADQL0008,
            format!(
                "\"{}\" is a {what} and cannot be used as identifier! Put it between double quotes: \"{}\"",
                token.image, token.image
            ),
        )
    }

    /// `ident {. ident}`, at most `max` parts; stops before `.*`
    pub(crate) fn qualified_parts(&mut self, max: usize) -> PResult<Vec<Identifier>> {
        let mut parts = vec![self.identifier()?];
        while self.check(TokenKind::Dot)
            && self.peek_nth(1) != TokenKind::Asterisk
            && parts.len() < max
        {
            self.advance();
            parts.push(self.identifier()?);
        }
        Ok(parts)
    }

    /// Reject `ident.` where only an unqualified name is allowed; the error
    /// points at the dot
    pub(crate) fn reject_qualified(&mut self, expected: &[&str]) -> PResult<()> {
        if self.at_identifier() && self.peek_nth(1) == TokenKind::Dot {
            self.advance();
            return Err(self.unexpected(expected));
        }
        Ok(())
    }

    /// Optional alias: `AS name` or a bare identifier
    pub(crate) fn alias(&mut self) -> PResult<Option<Identifier>> {
        if self.eat_kw(Keyword::As) {
            return self.identifier().map(Some);
        }
        if matches!(self.peek(), TokenKind::Identifier | TokenKind::DelimitedIdentifier) {
            return self.identifier().map(Some);
        }
        Ok(None)
    }

    /// Unsigned integer literal, as used by TOP and OFFSET
    pub(crate) fn unsigned_integer(&mut self) -> PResult<u64> {
        let token = *self.current();
        let value = match token.kind {
            TokenKind::Number(
                kind @ (adql_ast::NumberKind::Integer | adql_ast::NumberKind::Hex),
            ) => adql_ast::NumericLiteral::new(token.image, kind).as_u64(),
            _ => None,
        };
        match value {
            Some(value) => {
                self.advance();
                Ok(value)
            }
            None => Err(match self.unexpected(&["<unsigned integer>"]) {
                ParseError::Syntax(mut error) => {
                    error.code = ADQL0013;
                    ParseError::Syntax(error)
                }
                other => other,
            }),
        }
    }
}
