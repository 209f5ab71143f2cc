use super::{
    lexer::{Keyword, Operator, TokenKind},
    Parse, ParseErrorKind, ParseRes, Parser, WantedSpec,
};
use crate::{
    ast::{Statement, Type},
    error::Span,
};

impl<'source> Parse<'source> for (Statement<'source>, Span) {
    fn parse(parser: &mut Parser<'source>) -> ParseRes<Self> {
        parser.with_context("parsing statement", |parser| {
            let found =
                parser.expect_a_token(Some(WantedSpec::Description("statement")))?;
            match found {
                TokenKind::Keyword(Keyword::IntDecl) => declaration(parser, Type::Int),
                TokenKind::Keyword(Keyword::BoolDecl) => declaration(parser, Type::Bool),
                TokenKind::Keyword(Keyword::If) => if_statement(parser),
                TokenKind::Keyword(Keyword::Print) => print_statement(parser),
                TokenKind::Identifier => assignment(parser),
                found => parser.reject_current_token(ParseErrorKind::Expected {
                    wanted: WantedSpec::Description(
                        "declaration, assignment, if or print statement",
                    ),
                    found,
                }),
            }
        })
    }
}

// `I idade;` or `B maior;`
fn declaration<'source>(
    parser: &mut Parser<'source>,
    ty: Type,
) -> ParseRes<(Statement<'source>, Span)> {
    let start = parser.current_position();
    parser.accept_current();
    let name = parser.identifier()?;
    let end = semicolon(parser)?;
    Ok((
        Statement::Declare { ty, name },
        Span {
            offset: start,
            len: end - start,
        },
    ))
}

// `idade = 17;`
fn assignment<'source>(parser: &mut Parser<'source>) -> ParseRes<(Statement<'source>, Span)> {
    let target = parser.identifier()?;
    parser.expect_token(TokenKind::Operator {
        kind: Operator::Equals,
        has_equal: false,
    })?;
    parser.accept_current();
    let value = parser.parse()?;
    let end = semicolon(parser)?;
    Ok((
        Statement::Assign { target, value },
        Span {
            offset: target.span.offset,
            len: end - target.span.offset,
        },
    ))
}

// `Au (cond) { ... }` with an optional `Cu { ... }`
fn if_statement<'source>(parser: &mut Parser<'source>) -> ParseRes<(Statement<'source>, Span)> {
    let start = parser.current_position();
    parser.accept_current();
    let condition = parser.with_context("parsing if condition", |parser| {
        parser.expect_token(TokenKind::OpenParen)?;
        parser.accept_current();
        let condition = parser.parse()?;
        parser.expect_token(TokenKind::CloseParen)?;
        parser.accept_current();
        Ok(condition)
    })?;

    let (true_branch, true_span): (_, Span) = parser.parse()?;
    let (false_branch, end) = if parser.peek_token()? == Some(TokenKind::Keyword(Keyword::Else)) {
        parser.accept_current();
        let (block, block_span): (_, Span) = parser.parse()?;
        (Some(block), block_span.offset + block_span.len)
    } else {
        (None, true_span.offset + true_span.len)
    };

    Ok((
        Statement::If {
            condition,
            true_branch,
            false_branch,
        },
        Span {
            offset: start,
            len: end - start,
        },
    ))
}

// `P("Maior de idade");`
fn print_statement<'source>(parser: &mut Parser<'source>) -> ParseRes<(Statement<'source>, Span)> {
    let start = parser.current_position();
    parser.accept_current();
    parser.expect_token(TokenKind::OpenParen)?;
    parser.accept_current();
    parser.expect_token(TokenKind::String)?;
    let message = parser.current_token_source();
    parser.accept_current();
    parser.expect_token(TokenKind::CloseParen)?;
    parser.accept_current();
    let end = semicolon(parser)?;
    Ok((
        Statement::Print { message },
        Span {
            offset: start,
            len: end - start,
        },
    ))
}

/// Consumes the terminating semicolon, returning the offset just past it.
fn semicolon(parser: &mut Parser) -> ParseRes<usize> {
    parser.expect_token(TokenKind::Semicolon)?;
    let end = parser.current_position() + 1;
    parser.accept_current();
    Ok(end)
}
