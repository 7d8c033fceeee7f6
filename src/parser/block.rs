use crate::ast::{
    BlockStatement, CallExpression, Expr, FunctionDeclaration, Identifier,
    LegacyAssignmentExpression, LabeledStatement, Script, Stmt,
};
use crate::token::{Span, Token, TokenKind};

use super::command::{command, literal};
use super::expression::{self, LOWEST, identifier};
use super::flow::flow;
use super::hotkey::{hotkey, hotstring};
use super::state::ParseState;
use super::{ParseError, ParseResult};

type StatementParser = fn(&mut ParseState<'_>) -> ParseResult<Stmt>;

/// Statement rules in the order they are tried.
const STATEMENTS: [StatementParser; 7] = [
    hotstring,
    hotkey,
    label,
    block,
    flow,
    command,
    expression_statement,
];

pub(crate) fn statement(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    for parser in STATEMENTS {
        if let Some(stmt) = state.attempt(parser)? {
            return Ok(Some(stmt));
        }
    }
    Ok(None)
}

/// Statements up to the first one that does not end its logical line.
fn body(state: &mut ParseState<'_>) -> Result<Vec<Stmt>, ParseError> {
    let mut body = Vec::new();
    while !state.eof() {
        let Some(stmt) = statement(state)? else {
            break;
        };
        body.push(stmt);
        if !state.sol() {
            break;
        }
    }
    Ok(body)
}

pub(crate) fn script(state: &mut ParseState<'_>) -> Result<Script, ParseError> {
    let body = body(state)?;
    if !state.eof() {
        return Err(state.error());
    }

    let (start, end) = match (body.first(), body.last()) {
        (Some(first), Some(last)) => (first.span().start, last.span().end),
        _ => (0, state.source.len()),
    };
    Ok(Script {
        body,
        comments: Vec::new(),
        span: Span {
            start,
            end,
            line: 0,
            col: 0,
        },
    })
}

fn block(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    Ok(block_statement(state)?.map(Stmt::Block))
}

fn block_statement(state: &mut ParseState<'_>) -> ParseResult<BlockStatement> {
    let Some(open) = state.current().filter(|t| t.text == "{") else {
        return Ok(None);
    };
    state.advance();
    let body = body(state)?;
    state.expect("}")?;
    Ok(Some(BlockStatement {
        body,
        span: state.span_from(open.span),
    }))
}

/// `Name:` alone on its line.
fn label(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    let Some(start) = state.current() else {
        return Ok(None);
    };
    if !state.sol() {
        return Ok(None);
    }

    let mut last: Option<&Token> = None;
    while let Some(token) = state.current() {
        if last.is_some() && state.sol() {
            return Ok(None);
        }
        if token.text == ":" && last.is_some() && state.ends_line(0) {
            state.advance();
            return Ok(Some(Stmt::Label(LabeledStatement {
                name: state.source[start.span.start..token.span.start].to_string(),
                span: state.span_from(start.span),
            })));
        }
        let adjacent = last.is_none_or(|prev| prev.touches(token));
        if !adjacent || matches!(token.text.as_str(), "," | "`" | ":") {
            return Ok(None);
        }
        last = Some(token);
        state.advance();
    }
    Ok(None)
}

fn expression_statement(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    if let Some(assignment) = legacy_assignment(state) {
        return Ok(Some(Stmt::Expression(assignment)));
    }

    let starts_line = state.sol();
    let Some(expr) = expression::expression(state, LOWEST)? else {
        return Ok(None);
    };

    let opens_block = state.current().is_some_and(|t| t.text == "{");
    if !starts_line || !opens_block {
        return Ok(Some(Stmt::Expression(expr)));
    }
    match declaration_head(expr) {
        Ok((name, params)) => {
            let body = block_statement(state)?.ok_or_else(|| state.error())?;
            let span = name.span.to(body.span.end);
            Ok(Some(Stmt::Function(FunctionDeclaration {
                name,
                params,
                body,
                span,
            })))
        }
        Err(expr) => Ok(Some(Stmt::Expression(expr))),
    }
}

/// Name and arguments of `name(args)`, or the expression back unchanged.
fn declaration_head(expr: Expr) -> Result<(Identifier, Vec<Option<Expr>>), Expr> {
    match expr {
        Expr::Call(call) => match *call.callee {
            Expr::Identifier(name) => Ok((name, call.arguments)),
            callee => Err(Expr::Call(CallExpression {
                callee: Box::new(callee),
                ..call
            })),
        },
        other => Err(other),
    }
}

/// `name = text`: the right side is legacy text, possibly empty.
fn legacy_assignment(state: &mut ParseState<'_>) -> Option<Expr> {
    let name = state.current()?;
    let operator = state.token(1)?;
    if name.kind != TokenKind::Word || operator.text != "=" || !state.continues(1) {
        return None;
    }

    state.pos += 2;
    let right = literal(state, |_| false);
    Some(Expr::LegacyAssignment(LegacyAssignmentExpression {
        left: identifier(name),
        right,
        span: state.span_from(name.span),
    }))
}
