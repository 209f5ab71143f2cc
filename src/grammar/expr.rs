use super::lexer::TokenKind;
use super::{Parse, ParseErrorKind, ParseRes, Parser, WantedSpec};
use crate::ast::{BinaryOp, Expr};
use crate::error::Span;

impl<'source> Parse<'source> for (Expr<'source>, Span) {
    fn parse(parser: &mut Parser<'source>) -> ParseRes<Self> {
        parser.with_context("parsing expression", |parser| {
            let primary = parse_primary(parser)?;
            parse_binary_expression(parser, primary, 0)
        })
    }
}

// number, identifier or parenthesised expression
fn parse_primary<'source>(parser: &mut Parser<'source>) -> ParseRes<(Expr<'source>, Span)> {
    match parser.expect_a_token(Some(WantedSpec::Description("expression")))? {
        TokenKind::OpenParen => {
            let start = parser.current_position();
            parser.accept_current();
            let (inner, _) = parser.parse()?;
            parser
                .expect_token(TokenKind::CloseParen)
                .map_err(|e| e.add_context("closing a parenthesised expression"))?;
            let end = parser.current_position() + 1;
            parser.accept_current();
            Ok((
                inner,
                Span {
                    offset: start,
                    len: end - start,
                },
            ))
        }
        TokenKind::Number => {
            let src = parser.current_token_source();
            let constant = match src.source.parse() {
                Ok(value) => value,
                Err(_) => {
                    return parser.reject_current_token(ParseErrorKind::NumberOutOfRange)
                }
            };
            parser.accept_current();
            Ok((Expr::Constant(constant), src.span))
        }
        TokenKind::Identifier => {
            let name = parser.current_token_source();
            parser.accept_current();
            Ok((Expr::Variable { name }, name.span))
        }
        found => parser.reject_current_token(ParseErrorKind::Expected {
            wanted: WantedSpec::Description("open paren, identifier or number"),
            found,
        }),
    }
}

// precedence climbing; all the operators we have are left-associative
fn parse_binary_expression<'source>(
    parser: &mut Parser<'source>,
    mut lhs: (Expr<'source>, Span),
    min_precedence: u8,
) -> ParseRes<(Expr<'source>, Span)> {
    loop {
        let operator = match parser
            .peek_token()?
            .and_then(TokenKind::as_operator)
            .and_then(BinaryOp::from_operator)
        {
            Some(op) if op.precedence() >= min_precedence => op,
            _ => return Ok(lhs),
        };
        parser.accept_current();
        let mut rhs = parse_primary(parser)?;
        while let Some(next) = parser
            .peek_token()?
            .and_then(TokenKind::as_operator)
            .and_then(BinaryOp::from_operator)
        {
            if next.precedence() > operator.precedence() {
                rhs = parse_binary_expression(parser, rhs, next.precedence())?;
            } else {
                break;
            }
        }
        let span = Span {
            offset: lhs.1.offset,
            len: rhs.1.offset + rhs.1.len - lhs.1.offset,
        };
        lhs = (
            Expr::Binary {
                operator,
                lhs: (Box::new(lhs.0), lhs.1),
                rhs: (Box::new(rhs.0), rhs.1),
            },
            span,
        );
    }
}
