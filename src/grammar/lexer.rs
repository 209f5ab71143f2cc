use crate::error::{self, SourceMetadata, Span, WantedSpec};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use lazy_static::lazy_static;

lazy_static! {
    /// Reserved words of the language. Everything else that lexes like an
    /// identifier is one.
    static ref KEYWORDS: HashMap<&'static str, Keyword> = {
        let mut map = HashMap::new();
        map.insert("I", Keyword::IntDecl);
        map.insert("B", Keyword::BoolDecl);
        map.insert("Au", Keyword::If);
        map.insert("Cu", Keyword::Else);
        map.insert("P", Keyword::Print);
        map
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Semicolon,
    Number,
    Identifier,
    String,
    Keyword(Keyword),
    Operator { kind: Operator, has_equal: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `I`, declares an integer variable
    IntDecl,
    /// `B`, declares a boolean variable
    BoolDecl,
    /// `Au`, heads an if statement
    If,
    /// `Cu`, heads the else branch
    Else,
    /// `P`, prints a string literal
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    AngleLeft,
    AngleRight,
    Equals,
    ExclamationMark,
}

impl TokenKind {
    pub const fn as_operator(self) -> Option<(Operator, bool)> {
        if let TokenKind::Operator { kind, has_equal } = self {
            Some((kind, has_equal))
        } else {
            None
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OpenBrace => write!(f, "opening brace '{{'"),
            Self::CloseBrace => write!(f, "closing brace '}}'"),
            Self::OpenParen => write!(f, "opening parentheses '('"),
            Self::CloseParen => write!(f, "closing parentheses ')'"),
            Self::Semicolon => write!(f, "semicolon ';'"),
            Self::Number => write!(f, "number"),
            Self::Identifier => write!(f, "identifier"),
            Self::String => write!(f, "string literal"),
            Self::Keyword(kw) => write!(f, "keyword '{}'", kw),
            Self::Operator { kind, has_equal } => write!(
                f,
                "operator '{}{}'",
                kind,
                if *has_equal { "=" } else { "" }
            ),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::IntDecl => "I",
            Self::BoolDecl => "B",
            Self::If => "Au",
            Self::Else => "Cu",
            Self::Print => "P",
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::AngleLeft => "<",
            Self::AngleRight => ">",
            Self::Equals => "=",
            Self::ExclamationMark => "!",
        })
    }
}

/// A lexeme together with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'source> {
    pub span: Span,
    pub source: &'source str,
}

#[derive(Debug)]
pub struct Token<'source> {
    pub kind: TokenKind,
    pub source: Source<'source>,
}

impl<'source> Token<'source> {
    pub const fn new(kind: TokenKind, source: Source<'source>) -> Self {
        Self { kind, source }
    }
}

#[derive(Debug)]
pub enum LexErrorKind {
    UnexpectedChar(char),
    UnterminatedString,
    Expected {
        wanted: error::WantedSpec<char>,
        found: char,
    },
}

impl Error for LexErrorKind {}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(ch) => write!(f, "unexpected {:?}", ch),
            Self::UnterminatedString => f.write_str("unterminated string literal"),
            Self::Expected { wanted, found } => {
                write!(f, "unexpected {:?}, expected {}", found, wanted)
            }
        }
    }
}

pub type LexError = error::Error<LexErrorKind>;

pub struct Lexer<'a> {
    input: std::iter::Peekable<std::str::CharIndices<'a>>,
    metadata: &'a SourceMetadata<'a>,
}

impl<'source> Lexer<'source> {
    pub fn new(input: &'source SourceMetadata<'source>) -> Self {
        Self {
            input: input.input().char_indices().peekable(),
            metadata: input,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'source>>, LexError> {
        self.skip_whitespace();
        for (ch, kind) in [
            ('(', TokenKind::OpenParen),
            (')', TokenKind::CloseParen),
            ('{', TokenKind::OpenBrace),
            ('}', TokenKind::CloseBrace),
            (';', TokenKind::Semicolon),
        ] {
            if let Some(pos) = self.eat_char(ch) {
                self.advance();
                return Ok(Some(Token::new(kind, self.source_from(pos, pos + 1))));
            }
        }
        if let Some(src) = self.identifier() {
            let kind = match KEYWORDS.get(src.source) {
                Some(kw) => TokenKind::Keyword(*kw),
                None => TokenKind::Identifier,
            };
            return Ok(Some(Token::new(kind, src)));
        }
        if let Some(src) = self.string_literal()? {
            return Ok(Some(Token::new(TokenKind::String, src)));
        }
        if let Some((start, kind)) = self.operator() {
            let has_equal = self.skip_if(|ch| ch == '=').is_some();
            let src = self.source_until_current(start);
            return Ok(Some(Token::new(TokenKind::Operator { kind, has_equal }, src)));
        }
        if let Some(src) = self.number().map_err(|e| e.add_context("lexing a number"))? {
            return Ok(Some(Token::new(TokenKind::Number, src)));
        }
        match self.input.peek().copied() {
            None => Ok(None),
            Some((pos, ch)) => Err(self.error(pos, LexErrorKind::UnexpectedChar(ch))),
        }
    }

    fn operator(&mut self) -> Option<(usize, Operator)> {
        let (start, ch) = *self.input.peek()?;
        let op = match ch {
            '+' => Operator::Plus,
            '-' => Operator::Minus,
            '*' => Operator::Star,
            '/' => Operator::Slash,
            '<' => Operator::AngleLeft,
            '>' => Operator::AngleRight,
            '=' => Operator::Equals,
            '!' => Operator::ExclamationMark,
            _ => return None,
        };
        self.advance();
        Some((start, op))
    }

    fn identifier(&mut self) -> Option<Source<'source>> {
        let (start, _) = self.skip_if(|c| c.is_ascii_alphabetic() || c == '_')?;
        self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_');
        Some(self.source_until_current(start))
    }

    /// Strings have no escape sequences; the quotes are part of the span
    /// but not of the lexeme.
    fn string_literal(&mut self) -> Result<Option<Source<'source>>, LexError> {
        let start = match self.eat_char('"') {
            Some(pos) => pos,
            None => return Ok(None),
        };
        self.advance();
        loop {
            match self.input.peek().copied() {
                Some((end, '"')) => {
                    self.advance();
                    return Ok(Some(Source {
                        span: Span {
                            offset: start,
                            len: end + 1 - start,
                        },
                        source: &self.metadata.input()[start + 1..end],
                    }));
                }
                Some(_) => self.advance(),
                None => return Err(self.error(start, LexErrorKind::UnterminatedString)),
            }
        }
    }

    fn number(&mut self) -> Result<Option<Source<'source>>, LexError> {
        let start = match self.skip_if(|c| c.is_ascii_digit()) {
            Some((pos, _)) => pos,
            None => return Ok(None),
        };
        self.skip_while(|c| c.is_ascii_digit());
        if let Some((pos, ch)) = self
            .input
            .peek()
            .filter(|(_, ch)| ch.is_ascii_alphanumeric() || *ch == '_')
            .copied()
        {
            return Err(self.error(
                pos,
                LexErrorKind::Expected {
                    wanted: WantedSpec::Description("delimiter or space after number"),
                    found: ch,
                },
            ));
        }
        Ok(Some(self.source_until_current(start)))
    }

    fn skip_while<F>(&mut self, filter: F)
    where
        F: Fn(char) -> bool,
    {
        while self.input.peek().filter(|(_, ch)| filter(*ch)).is_some() {
            self.advance();
        }
    }

    fn skip_if<F>(&mut self, filter: F) -> Option<(usize, char)>
    where
        F: Fn(char) -> bool,
    {
        let (pos, ch) = *self.input.peek()?;
        if filter(ch) {
            self.advance();
            Some((pos, ch))
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(char::is_whitespace);
    }

    fn advance(&mut self) {
        self.input.next();
    }

    fn source_until_current(&mut self, start: usize) -> Source<'source> {
        let current = self.current_offset();
        self.source_from(start, current)
    }

    fn source_from(&self, start: usize, end: usize) -> Source<'source> {
        Source {
            span: Span {
                offset: start,
                len: end - start,
            },
            source: &self.metadata.input()[start..end],
        }
    }

    fn eat_char(&mut self, ch: char) -> Option<usize> {
        self.input
            .peek()
            .filter(|(_, x)| *x == ch)
            .map(|(pos, _)| *pos)
    }

    fn error(&self, position: usize, kind: LexErrorKind) -> LexError {
        LexError::new(kind).with_source(Span::new(position), self.metadata)
    }

    pub fn current_span(&mut self) -> Span {
        Span::new(self.current_offset())
    }

    pub const fn get_metadata(&self) -> &SourceMetadata<'source> {
        self.metadata
    }

    fn current_offset(&mut self) -> usize {
        let source_len = self.metadata.input().len();
        self.input.peek().map_or(source_len, |(pos, _)| *pos)
    }
}
