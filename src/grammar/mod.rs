//! Hand-rolled recursive-descent front end: one [`Parse`] impl per node.
use crate::error::*;

mod block;
mod expr;
pub mod lexer;
mod program;
mod statement;

use lexer::*;

pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current_tok: Option<Token<'source>>,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source SourceMetadata<'source>) -> Self {
        Self {
            lexer: Lexer::new(source),
            current_tok: None,
        }
    }
    pub fn current_position(&self) -> usize {
        self.current_token_span().offset
    }

    pub fn peek_token(&mut self) -> ParseRes<Option<TokenKind>> {
        if self.current_tok.is_none() {
            self.current_tok = self
                .lexer
                .next_token()
                .map_err(|e| e.map_kind(ParseErrorKind::LexError))?;
        }
        Ok(self.current_tok.as_ref().map(|tok| tok.kind))
    }
    pub fn current_token_span(&self) -> Span {
        self.current_tok
            .as_ref()
            .map(|tok| tok.source.span)
            .expect("called current_token_span with no token")
    }
    pub fn current_token_source(&self) -> Source<'source> {
        self.current_tok
            .as_ref()
            .map(|tok| tok.source)
            .expect("called current_token_source with no token")
    }
    pub fn accept_current(&mut self) {
        self.current_tok = None;
    }
    pub fn emit_error_at<T>(&self, span: Span, kind: ParseErrorKind) -> ParseRes<T> {
        Err(ParseError::new(kind).with_source(span, self.lexer.get_metadata()))
    }
    pub fn expect_a_token(&mut self, wanted: Option<WantedSpec<TokenKind>>) -> ParseRes<TokenKind> {
        let span = self.lexer.current_span();
        self.peek_token()?.map_or_else(
            || self.emit_error_at(span, ParseErrorKind::UnexpectedEOF { wanted }),
            Ok,
        )
    }
    pub fn reject_current_token<T>(&self, reason: ParseErrorKind) -> ParseRes<T> {
        self.emit_error_at(self.current_token_span(), reason)
    }
    pub fn expect_token(&mut self, kind: TokenKind) -> ParseRes<()> {
        self.expect_a_token(Some(WantedSpec::Specific(kind)))
            .and_then(|tok| {
                if tok == kind {
                    Ok(())
                } else {
                    self.reject_current_token(ParseErrorKind::Expected {
                        wanted: WantedSpec::Specific(kind),
                        found: tok,
                    })
                }
            })
    }
    /// Parses an identifier, returning its lexeme and span.
    pub fn identifier(&mut self) -> ParseRes<Source<'source>> {
        self.expect_token(TokenKind::Identifier)?;
        let src = self.current_token_source();
        self.accept_current();
        Ok(src)
    }
    pub fn parse<T>(&mut self) -> ParseRes<T>
    where
        T: Parse<'source>,
    {
        T::parse(self)
    }
    pub fn with_context<F, T>(&mut self, context: &'static str, mut cont: F) -> ParseRes<T>
    where
        F: FnMut(&mut Self) -> ParseRes<T>,
    {
        cont(self).map_err(|e| e.add_context(context))
    }
}

pub type ParseRes<T> = Result<T, ParseError>;
pub type ParseError = Error<ParseErrorKind>;

#[derive(Debug)]
pub enum ParseErrorKind {
    LexError(LexErrorKind),
    Expected {
        wanted: WantedSpec<TokenKind>,
        found: TokenKind,
    },
    UnexpectedEOF {
        wanted: Option<WantedSpec<TokenKind>>,
    },
    NumberOutOfRange,
}

impl ParseErrorKind {
    /// Lexical errors are a stage of their own in the final report.
    pub const fn is_lexical(&self) -> bool {
        matches!(self, Self::LexError(_))
    }
}

use std::error;
impl error::Error for ParseErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        if let Self::LexError(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

use std::fmt;
impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LexError(err) => write!(f, "error while lexing source: {}", err),
            Self::UnexpectedEOF { wanted } => {
                write!(f, "unexpected end of input")?;
                if let Some(wanted) = wanted {
                    write!(f, ", expected {}", wanted)
                } else {
                    Ok(())
                }
            }
            Self::Expected { wanted, found } => {
                write!(f, "expected {}, but found instead {}", wanted, found)
            }
            Self::NumberOutOfRange => f.write_str("integer literal does not fit in 64 bits"),
        }
    }
}

pub trait Parse<'source>: Sized {
    fn parse(parser: &mut Parser<'source>) -> ParseRes<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Program, Relational, Statement, Type};

    #[test]
    fn parses_the_sample_program() {
        let meta = SourceMetadata::new(
            r#"
            I idade;
            idade = 17;
            Au (idade >= 18) {
                P("Maior de idade");
            } Cu {
                P("Menor de idade");
            }
            "#,
        );
        let Program(statements) = Parser::new(&meta).parse().expect("parse failed");
        assert_eq!(statements.len(), 3);
        assert!(matches!(
            statements[0].0,
            Statement::Declare { ty: Type::Int, name } if name.source == "idade"
        ));
        assert!(matches!(
            statements[1].0,
            Statement::Assign { target, value: (Expr::Constant(17), _) } if target.source == "idade"
        ));
        match &statements[2].0 {
            Statement::If {
                condition: (Expr::Binary { operator, .. }, _),
                true_branch,
                false_branch: Some(false_branch),
            } => {
                assert_eq!(
                    *operator,
                    BinaryOp::Relational(Relational::GreaterEqual)
                );
                assert_eq!(true_branch.statements.len(), 1);
                assert_eq!(false_branch.statements.len(), 1);
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_binds_tighter_than_relationals() {
        let meta = SourceMetadata::new("x = a + 1 < b * 2;");
        let Program(statements) = Parser::new(&meta).parse().expect("parse failed");
        match &statements[0].0 {
            Statement::Assign {
                value: (Expr::Binary { operator, lhs, rhs }, _),
                ..
            } => {
                assert_eq!(*operator, BinaryOp::Relational(Relational::Less));
                assert!(matches!(*lhs.0, Expr::Binary { .. }));
                assert!(matches!(*rhs.0, Expr::Binary { .. }));
            }
            other => panic!("expected relational assign, got {:?}", other),
        }
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let meta = SourceMetadata::new("I idade");
        let result: ParseRes<Program> = Parser::new(&meta).parse();
        let err = result.unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEOF { .. }));
        assert!(!err.kind.is_lexical());
    }

    #[test]
    fn lex_errors_surface_as_their_own_stage() {
        let meta = SourceMetadata::new("I idade; idade = @;");
        let result: ParseRes<Program> = Parser::new(&meta).parse();
        let err = result.unwrap_err();
        assert!(err.kind.is_lexical());
    }

    #[test]
    fn else_branch_is_optional() {
        let meta = SourceMetadata::new(r#"I x; x = 1; Au (x < 2) { P("ok"); }"#);
        let Program(statements) = Parser::new(&meta).parse().expect("parse failed");
        assert!(matches!(
            statements[2].0,
            Statement::If {
                false_branch: None,
                ..
            }
        ));
    }
}
