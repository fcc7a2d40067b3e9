//! ADQL tokenizer
//!
//! Pull-based: [`Tokenizer::next_token`] skips whitespace and `--` comments,
//! then lexes one token. Lexemes are recognised with winnow combinators over
//! the remaining input; the tokenizer itself only tracks the byte offset and
//! the line/column of the cursor.
//!
//! Line endings are not normalised here: a `\r` is a plain whitespace
//! character and only `\n` starts a new line. Tabs count as one column.

use crate::token::{Keyword, Token, TokenKind, is_sql_reserved};
use adql_ast::{AdqlVersion, NumberKind};
use adql_diagnostics::{ADQL0003, ADQL0004, ADQL0005, ADQL0006, LexicalError, Span, TextPosition};
use winnow::ascii::{digit0, digit1, hex_digit1, multispace1, till_line_ending};
use winnow::combinator::{alt, opt, repeat};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

type Input<'s> = &'s str;

/// Whitespace and `--` comments
fn trivia(input: &mut Input<'_>) -> ModalResult<()> {
    repeat(0.., alt((multispace1.void(), ("--", till_line_ending).void()))).parse_next(input)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word<'s>(input: &mut Input<'s>) -> ModalResult<&'s str> {
    take_while(1.., is_word_char).parse_next(input)
}

fn hex_number(input: &mut Input<'_>) -> ModalResult<NumberKind> {
    ('0', one_of(['x', 'X']), hex_digit1)
        .value(NumberKind::Hex)
        .parse_next(input)
}

fn decimal_number(input: &mut Input<'_>) -> ModalResult<NumberKind> {
    let fractional = alt((
        (digit1, opt(('.', digit0))).map(|(_, fraction)| fraction.is_some()),
        ('.', digit1).value(true),
    ))
    .parse_next(input)?;
    let exponent = opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)).parse_next(input)?;
    Ok(match (fractional, exponent) {
        (_, Some(_)) => NumberKind::Real,
        (true, None) => NumberKind::Decimal,
        (false, None) => NumberKind::Integer,
    })
}

/// Body of a quoted lexeme, where a doubled quote stands for one quote
fn quoted_body(quote: char) -> impl FnMut(&mut Input<'_>) -> ModalResult<()> {
    move |input: &mut Input<'_>| {
        repeat(
            0..,
            alt((
                take_till(1.., move |c: char| c == quote).void(),
                (quote, quote).void(),
            )),
        )
        .parse_next(input)
    }
}

pub struct Tokenizer<'s> {
    source: &'s str,
    offset: usize,
    line: u32,
    column: u32,
    version: AdqlVersion,
    /// Kind of the last token lexed
    previous: Option<TokenKind>,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str, version: AdqlVersion) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            version,
            previous: None,
        }
    }

    pub fn version(&self) -> AdqlVersion {
        self.version
    }

    /// Lex the next token. Past the end of the input every call returns
    /// an `Eof` token.
    pub fn next_token(&mut self) -> Result<Token<'s>, LexicalError> {
        self.run(trivia);

        let (line, column) = (self.line, self.column);
        let start = self.offset;
        let rest = &self.source[start..];
        let Some(first) = rest.chars().next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                image: "",
                span: Span::new(start, start),
                position: TextPosition::new(line, column, line, column),
                function_name: false,
            });
        };
        let second = rest[first.len_utf8()..].chars().next();

        let kind = match first {
            '\'' => self.quoted('\'', TokenKind::String)?,
            '"' => self.quoted('"', TokenKind::DelimitedIdentifier)?,
            '0'..='9' => self.number(),
            '.' if second.is_some_and(|c| c.is_ascii_digit()) && !self.after_name() => self.number(),
            c if is_word_char(c) => {
                let image = self.run(word);
                self.classify(image)
            }
            _ => {
                let (kind, width) = match (first, second) {
                    ('|', Some('|')) => (TokenKind::Concat, 2),
                    ('<', Some('>')) | ('!', Some('=')) => (TokenKind::NotEqual, 2),
                    ('<', Some('=')) => (TokenKind::LessEqual, 2),
                    ('>', Some('=')) => (TokenKind::GreaterEqual, 2),
                    ('(', _) => (TokenKind::LeftParen, 1),
                    (')', _) => (TokenKind::RightParen, 1),
                    (',', _) => (TokenKind::Comma, 1),
                    ('.', _) => (TokenKind::Dot, 1),
                    ('*', _) => (TokenKind::Asterisk, 1),
                    ('+', _) => (TokenKind::Plus, 1),
                    ('-', _) => (TokenKind::Minus, 1),
                    ('/', _) => (TokenKind::Slash, 1),
                    ('=', _) => (TokenKind::Equal, 1),
                    ('<', _) => (TokenKind::Less, 1),
                    ('>', _) => (TokenKind::Greater, 1),
                    ('&', _) => (TokenKind::Ampersand, 1),
                    ('|', _) => (TokenKind::Pipe, 1),
                    ('^', _) => (TokenKind::Caret, 1),
                    ('~', _) => (TokenKind::Tilde, 1),
                    (';', _) => (TokenKind::EndOfQuery, 1),
                    (c, _) => {
                        return Err(LexicalError::new(
                            ADQL0003,
                            format!("Unknown character '{}'", c.escape_default()),
                            TextPosition::single(line, column),
                        )
                        .with_character(c));
                    }
                };
                self.bump(width);
                kind
            }
        };

        let image = &self.source[start..self.offset];
        let function_name = matches!(kind, TokenKind::Keyword(k) if k.is_function());
        let token = Token {
            kind,
            image,
            span: Span::new(start, self.offset),
            position: TextPosition::new(line, column, self.line, self.column),
            function_name,
        };
        log::trace!("token {:?} {:?} at {}", token.kind, token.image, token.position);
        self.previous = Some(kind);
        Ok(token)
    }

    /// Lex the whole input; the last token is `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token<'s>>, LexicalError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Run a lexeme parser at the cursor and move past what it consumed.
    /// Callers only use parsers that cannot fail or have already checked
    /// the first character.
    fn run<O: Default>(&mut self, mut parser: impl FnMut(&mut Input<'s>) -> ModalResult<O>) -> O {
        let mut rest: Input<'s> = &self.source[self.offset..];
        let before = rest.len();
        let output = parser.parse_next(&mut rest).unwrap_or_default();
        self.bump(before - rest.len());
        output
    }

    /// A `.` right after a name part separates the next part, as in
    /// `catalogs.2mass_psc`, and never starts a number
    fn after_name(&self) -> bool {
        matches!(
            self.previous,
            Some(TokenKind::Identifier | TokenKind::DelimitedIdentifier | TokenKind::SqlReserved | TokenKind::Dot)
        )
    }

    fn bump(&mut self, bytes: usize) {
        let end = self.offset + bytes;
        for c in self.source[self.offset..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = end;
    }

    fn number(&mut self) -> TokenKind {
        let kind = if self.version >= AdqlVersion::V2_1 {
            self.run(|input: &mut Input<'s>| alt((hex_number, decimal_number)).map(Some).parse_next(input))
        } else {
            self.run(|input: &mut Input<'s>| decimal_number.map(Some).parse_next(input))
        };
        // `2mass` and the like are identifier candidates
        if self.source[self.offset..].starts_with(is_word_char) {
            self.run(word);
            return TokenKind::Identifier;
        }
        TokenKind::Number(kind.unwrap_or(NumberKind::Integer))
    }

    fn quoted(&mut self, quote: char, kind: TokenKind) -> Result<TokenKind, LexicalError> {
        let (line, column) = (self.line, self.column);
        let start = self.offset;
        self.bump(1);
        self.run(quoted_body(quote));
        if !self.source[self.offset..].starts_with(quote) {
            let (code, what) = match kind {
                TokenKind::String => (ADQL0004, "string literal"),
                _ => (ADQL0005, "delimited identifier"),
            };
            return Err(LexicalError::new(
                code,
                format!("Unterminated {what} starting at line {line}, column {column}"),
                TextPosition::new(line, column, self.line, self.column),
            )
            .with_character(quote));
        }
        self.bump(1);
        if kind == TokenKind::DelimitedIdentifier && self.offset - start == 2 {
            return Err(LexicalError::new(
                ADQL0006,
                "Empty delimited identifier: \"\"",
                TextPosition::new(line, column, self.line, self.column),
            ));
        }
        Ok(kind)
    }

    fn classify(&self, word: &str) -> TokenKind {
        if let Some(keyword) = Keyword::lookup(word, self.version) {
            TokenKind::Keyword(keyword)
        } else if is_sql_reserved(word) {
            TokenKind::SqlReserved
        } else {
            TokenKind::Identifier
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str, version: AdqlVersion) -> Vec<TokenKind> {
        Tokenizer::new(source, version)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_numbers() {
        use NumberKind::*;
        assert_eq!(
            kinds("1 1.5 .5 2e-3 0x1F", AdqlVersion::V2_1),
            vec![
                TokenKind::Number(Integer),
                TokenKind::Number(Decimal),
                TokenKind::Number(Decimal),
                TokenKind::Number(Real),
                TokenKind::Number(Hex),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hex_needs_2_1() {
        assert_eq!(
            kinds("0x1F", AdqlVersion::V2_0),
            vec![TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_number_prefix_identifier() {
        let tokens = Tokenizer::new("2mass", AdqlVersion::V2_1).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].image, "2mass");
    }

    #[test]
    fn test_dot_after_name_separates_parts() {
        let tokens = Tokenizer::new("catalogs.2mass_psc", AdqlVersion::V2_1)
            .tokenize()
            .unwrap();
        let images: Vec<_> = tokens.iter().map(|t| (t.kind, t.image)).collect();
        assert_eq!(
            images,
            vec![
                (TokenKind::Identifier, "catalogs"),
                (TokenKind::Dot, "."),
                (TokenKind::Identifier, "2mass_psc"),
                (TokenKind::Eof, ""),
            ]
        );
        assert_eq!(
            kinds("SELECT .5", AdqlVersion::V2_1),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Number(NumberKind::Decimal),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = Tokenizer::new("SELECT -- all\n  a", AdqlVersion::V2_1)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[1].image, "a");
        assert_eq!(tokens[1].position, TextPosition::new(2, 3, 2, 4));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("|| <> != <= >= | <", AdqlVersion::V2_1),
            vec![
                TokenKind::Concat,
                TokenKind::NotEqual,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Pipe,
                TokenKind::Less,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_values() {
        let tokens = Tokenizer::new("'it''s' \"a \"\"b\"\"\"", AdqlVersion::V2_1)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].string_value(), "it's");
        assert_eq!(tokens[1].identifier_value(), "a \"b\"");
    }

    #[test]
    fn test_lexical_errors() {
        let err = Tokenizer::new("SELECT 'abc", AdqlVersion::V2_1).tokenize().unwrap_err();
        assert_eq!(err.code, ADQL0004);
        assert_eq!(err.position.begin_column, 8);

        let err = Tokenizer::new("a ? b", AdqlVersion::V2_1).tokenize().unwrap_err();
        assert_eq!(err.code, ADQL0003);
        assert_eq!(err.character, Some('?'));
        assert_eq!(err.position, TextPosition::single(1, 3));

        let err = Tokenizer::new("SELECT \"\"", AdqlVersion::V2_1).tokenize().unwrap_err();
        assert_eq!(err.code, ADQL0006);
    }
}
