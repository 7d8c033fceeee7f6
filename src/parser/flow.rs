use crate::ast::{
    CatchClause, Expr, ForStatement, Identifier, IfStatement, LegacyComparisonExpression, LoopKind,
    LoopStatement, Stmt, TryStatement, WhileStatement,
};
use crate::token::{Token, TokenKind};

use super::block::statement;
use super::command::{literal, params};
use super::expression::{self, Fixity, LOWEST, identifier, precedence};
use super::state::ParseState;
use super::{ParseError, ParseResult};

/// Reserved words of the flow grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    If,
    Else,
    While,
    Loop,
    Until,
    For,
    In,
    Try,
    Catch,
    Finally,
}

impl Keyword {
    const ALL: [(&'static str, Self); 10] = [
        ("if", Self::If),
        ("else", Self::Else),
        ("while", Self::While),
        ("loop", Self::Loop),
        ("until", Self::Until),
        ("for", Self::For),
        ("in", Self::In),
        ("try", Self::Try),
        ("catch", Self::Catch),
        ("finally", Self::Finally),
    ];

    pub fn of(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Word {
            return None;
        }
        Self::ALL
            .iter()
            .find(|(text, _)| token.is(text))
            .map(|&(_, keyword)| keyword)
    }

    /// Words that continue a statement and never start one.
    pub fn is_clause(token: &Token) -> bool {
        matches!(
            Self::of(token),
            Some(Self::Else | Self::Until | Self::Catch | Self::Finally)
        )
    }
}

/// Legacy comparison operators of `if var <op> text`, longest first.
const LEGACY_COMPARISONS: &[&[&str]] = &[
    &["is", "not"],
    &["not", "in"],
    &["not", "contains"],
    &["is"],
    &["in"],
    &["contains"],
];

pub(crate) fn flow(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    let Some(keyword) = state.current().and_then(Keyword::of) else {
        return Ok(None);
    };
    let statement = match keyword {
        Keyword::If => if_statement(state)?,
        Keyword::While => while_statement(state)?,
        Keyword::Loop => loop_statement(state)?,
        Keyword::For => for_statement(state)?,
        Keyword::Try => try_statement(state)?,
        Keyword::Else | Keyword::Until | Keyword::In | Keyword::Catch | Keyword::Finally => {
            return Ok(None);
        }
    };
    Ok(Some(statement))
}

fn required_statement(state: &mut ParseState<'_>) -> Result<Box<Stmt>, ParseError> {
    statement(state)?
        .map(Box::new)
        .ok_or_else(|| state.error())
}

fn at_keyword(state: &ParseState<'_>, keyword: Keyword) -> bool {
    state.current().and_then(Keyword::of) == Some(keyword)
}

/// Condition of `if` and `while`: a parenthesized expression, possibly
/// extended by binary operators, or a bare expression.
fn condition(state: &mut ParseState<'_>) -> Result<Expr, ParseError> {
    if state.current().is_some_and(|t| t.text == "(") {
        let group = expression::group(state)?;
        let extends = state.continue_line()
            && state
                .current()
                .is_some_and(|t| precedence(Fixity::Infix, &t.text).is_some());
        return if extends {
            expression::climb(state, group, LOWEST)
        } else {
            Ok(group)
        };
    }
    if state.eol() {
        return Err(state.error());
    }
    expression::expression(state, LOWEST)?.ok_or_else(|| state.error())
}

fn if_statement(state: &mut ParseState<'_>) -> Result<Stmt, ParseError> {
    let start = state.expect("if")?.span;

    let test = match legacy_comparison(state)? {
        Some(test) => test,
        None => condition(state)?,
    };
    let consequent = required_statement(state)?;
    let alternate = if at_keyword(state, Keyword::Else) {
        state.advance();
        Some(required_statement(state)?)
    } else {
        None
    };

    Ok(Stmt::If(IfStatement {
        test,
        consequent,
        alternate,
        span: state.span_from(start),
    }))
}

/// `name [not] in|contains|is text` after `if`.
fn legacy_comparison(state: &mut ParseState<'_>) -> ParseResult<Expr> {
    let Some(name) = state.current() else {
        return Ok(None);
    };
    if name.kind != TokenKind::Word || !state.continue_line() {
        return Ok(None);
    }

    let checkpoint = state.pos;
    state.advance();
    let Some(words) = LEGACY_COMPARISONS.iter().find(|words| state.matches(words)) else {
        state.pos = checkpoint;
        return Ok(None);
    };
    state.pos += words.len();

    let right = literal(state, |_| false).ok_or_else(|| state.error())?;
    let span = name.span.to(right.span.end);
    Ok(Some(Expr::LegacyComparison(LegacyComparisonExpression {
        operator: words.join(" ").to_ascii_lowercase(),
        left: identifier(name),
        right,
        span,
    })))
}

fn while_statement(state: &mut ParseState<'_>) -> Result<Stmt, ParseError> {
    let start = state.expect("while")?.span;
    let test = condition(state)?;
    let body = required_statement(state)?;
    Ok(Stmt::While(WhileStatement {
        test,
        body,
        span: state.span_from(start),
    }))
}

fn loop_kind(token: &Token) -> Option<LoopKind> {
    [
        ("files", LoopKind::Files),
        ("parse", LoopKind::Parse),
        ("read", LoopKind::Read),
        ("reg", LoopKind::Reg),
    ]
    .into_iter()
    .find(|(text, _)| token.is(text))
    .map(|(_, kind)| kind)
}

fn at_block_brace(state: &ParseState<'_>) -> bool {
    state.current().is_some_and(|t| t.text == "{") && state.ends_line(0)
}

fn skip_comma(state: &mut ParseState<'_>) {
    if state.continue_line() && state.current().is_some_and(|t| t.text == ",") {
        state.advance();
    }
}

fn until(state: &mut ParseState<'_>) -> Result<Option<Expr>, ParseError> {
    if !at_keyword(state, Keyword::Until) {
        return Ok(None);
    }
    state.advance();
    if state.eol() {
        return Err(state.error());
    }
    expression::expression(state, LOWEST)?
        .map(Some)
        .ok_or_else(|| state.error())
}

fn loop_statement(state: &mut ParseState<'_>) -> Result<Stmt, ParseError> {
    let start = state.expect("loop")?.span;
    skip_comma(state);

    let kind = match state.current().filter(|_| state.continue_line()).and_then(loop_kind) {
        Some(kind) => {
            state.advance();
            skip_comma(state);
            kind
        }
        None => LoopKind::Count,
    };

    let arguments = params(state, at_block_brace)?;
    let body = required_statement(state)?;
    let until = until(state)?;

    Ok(Stmt::Loop(LoopStatement {
        kind,
        arguments,
        body,
        until,
        span: state.span_from(start),
    }))
}

fn for_statement(state: &mut ParseState<'_>) -> Result<Stmt, ParseError> {
    let start = state.expect("for")?.span;

    let key = word(state)?;
    let value = if state.continue_line() && state.current().is_some_and(|t| t.text == ",") {
        state.advance();
        Some(word(state)?)
    } else {
        None
    };
    if !state.continue_line() || !at_keyword(state, Keyword::In) {
        return Err(state.error());
    }
    state.advance();
    if state.eol() {
        return Err(state.error());
    }
    let iterable = expression::expression(state, LOWEST)?.ok_or_else(|| state.error())?;
    let body = required_statement(state)?;
    let until = until(state)?;

    Ok(Stmt::For(ForStatement {
        key,
        value,
        iterable,
        body,
        until,
        span: state.span_from(start),
    }))
}

fn word(state: &mut ParseState<'_>) -> Result<Identifier, ParseError> {
    match state.current() {
        Some(token) if token.kind == TokenKind::Word && state.continue_line() => {
            state.advance();
            Ok(identifier(token))
        }
        _ => Err(state.error()),
    }
}

fn try_statement(state: &mut ParseState<'_>) -> Result<Stmt, ParseError> {
    let start = state.expect("try")?.span;
    let block = required_statement(state)?;

    let handler = if at_keyword(state, Keyword::Catch) {
        let catch = state.advance().map(|t| t.span).unwrap_or(start);
        let param = match state.current() {
            Some(token)
                if token.kind == TokenKind::Word
                    && state.continue_line()
                    && (state.ends_line(0) || state.token(1).is_some_and(|t| t.text == "{")) =>
            {
                state.advance();
                Some(identifier(token))
            }
            _ => None,
        };
        let body = required_statement(state)?;
        Some(CatchClause {
            param,
            body,
            span: state.span_from(catch),
        })
    } else {
        None
    };

    let finalizer = if at_keyword(state, Keyword::Finally) {
        state.advance();
        Some(required_statement(state)?)
    } else {
        None
    };

    Ok(Stmt::Try(TryStatement {
        block,
        handler,
        finalizer,
        span: state.span_from(start),
    }))
}
