//! Recursive-descent parser.
//!
//! Every grammar function returns [`ParseResult`]: `Ok(Some(node))` on a
//! match, `Ok(None)` when the construct does not start here (the cursor is
//! left where it was), and `Err` once a construct has committed and a
//! required piece is missing.

use std::fmt;

use crate::ast::{Comment, Expr, Script};
use crate::joiner::preprocess;
use crate::lexer::tokenize;
use crate::token::{Span, Token, TokenKind};

mod block;
mod command;
mod expression;
mod flow;
mod hotkey;
mod state;

use state::ParseState;

pub(crate) type ParseResult<T> = Result<Option<T>, ParseError>;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token that no grammar rule accepts at this position.
    UnexpectedToken(String),
    /// The input ended while a construct was still open.
    UnexpectedEof,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken(text) => write!(f, "Unexpected token: {text}"),
            Self::UnexpectedEof => write!(f, "Unexpected EOF"),
        }
    }
}

/// Error produced during parsing.
///
/// The span points at the offending token, or just past the last token
/// when the input ended early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line + 1, span.col + 1)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub(crate) fn at(token: &Token) -> Self {
        Self {
            kind: ParseErrorKind::UnexpectedToken(token.text.clone()),
            span: token.span,
        }
    }

    pub(crate) fn eof(last: Option<&Token>) -> Self {
        let span = last.map_or_else(Span::default, |last| Span {
            start: last.span.end,
            end: last.span.end,
            line: last.span.line,
            col: last.span.col + last.text.chars().count(),
        });
        Self {
            kind: ParseErrorKind::UnexpectedEof,
            span,
        }
    }
}

/// Parse an AutoHotkey script.
///
/// Empty input yields a [`Script`] with an empty body.
///
/// # Errors
///
/// Returns `ParseError` at the first token no statement rule accepts, or
/// when the input ends inside a construct.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse(source: &str) -> Result<Script, ParseError> {
    let stream = preprocess(source, tokenize(source));
    let mut state = ParseState::new(source, &stream);
    let mut script = block::script(&mut state)?;
    script.comments = stream.comments.iter().map(comment).collect();
    tracing::debug!(statements = script.body.len(), "parsed script");
    Ok(script)
}

/// Parse a single expression covering the whole input.
///
/// Returns `Ok(None)` when the input holds no expression.
///
/// # Errors
///
/// Returns `ParseError` on malformed input or when tokens are left over
/// after the expression.
pub fn parse_expression(source: &str) -> Result<Option<Expr>, ParseError> {
    let stream = preprocess(source, tokenize(source));
    let mut state = ParseState::new(source, &stream);
    let expr = expression::expression(&mut state, expression::LOWEST)?;
    if !state.eof() {
        return Err(state.error());
    }
    Ok(expr)
}

fn comment(token: &Token) -> Comment {
    debug_assert_eq!(token.kind, TokenKind::Comment);
    Comment {
        text: token.text.clone(),
        block: token.text.starts_with("/*"),
        span: token.span,
    }
}

/// Resolve backtick escapes and doubled quotes.
///
/// An unknown escape yields the escaped character itself.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{8}'),
                Some('t') => out.push('\t'),
                Some('v') => out.push('\u{b}'),
                Some('a') => out.push('\u{7}'),
                Some('f') => out.push('\u{c}'),
                Some(other) => out.push(other),
                None => out.push('`'),
            },
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                out.push('"');
            }
            _ => out.push(c),
        }
    }
    out
}
