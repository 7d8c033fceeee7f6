use crate::ast::{CommandStatement, Expr, LegacyLiteral, Stmt};
use crate::joiner::{Joiner, split_lines, strip_comment};
use crate::token::TokenKind;

use super::expression::{self, COMMA, Fixity, identifier, precedence};
use super::flow::Keyword;
use super::state::ParseState;
use super::{ParseError, ParseResult, unescape};

/// Commands whose parameters are expressions rather than legacy text.
const EXPRESSION_COMMANDS: &[&str] = &["return", "throw", "global", "local", "static"];

/// Parse command syntax such as `MsgBox, Hello` or `#Include lib.ahk`.
pub(crate) fn command(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    let Some(start) = state.current() else {
        return Ok(None);
    };

    let hash = start.text == "#"
        && state
            .token(1)
            .is_some_and(|next| next.kind == TokenKind::Word && start.touches(next));
    let offset = isize::from(hash);

    let Some(name) = state.token(offset) else {
        return Ok(None);
    };
    if name.kind != TokenKind::Word || Keyword::is_clause(name) || !is_command_at(state, offset) {
        return Ok(None);
    }

    state.pos += usize::from(hash) + 1;
    if state.continue_line() && state.current().is_some_and(|t| t.text == ",") {
        state.advance();
    }

    let arguments = if EXPRESSION_COMMANDS.iter().any(|c| name.is(c)) {
        let arguments = if state.eol() {
            Vec::new()
        } else {
            expression::list(state)?
        };
        if !state.eol() {
            return Err(state.error());
        }
        arguments
    } else {
        params(state, |_| false)?
    };

    Ok(Some(Stmt::Command(CommandStatement {
        name: identifier(name),
        hash,
        arguments,
        span: state.span_from(start.span),
    })))
}

/// Decide from the token after the name whether this is command syntax.
fn is_command_at(state: &ParseState<'_>, offset: isize) -> bool {
    let (Some(name), Some(next)) = (state.token(offset), state.token(offset + 1)) else {
        return true;
    };

    if !state.continues(offset + 1) || next.text == "," {
        return true;
    }
    if name.touches(next) {
        return false;
    }

    let text = next.text.as_str();
    if text == "=" || text == "++" || text == "--" || precedence(Fixity::Infix, text) == Some(1) {
        return false;
    }
    let operator = text == "?" || precedence(Fixity::Infix, text).is_some();
    let spaced = state
        .token(offset + 2)
        .is_none_or(|after| !next.touches(after));
    !(operator && spaced)
}

/// Comma-delimited parameters to the end of the logical line.
///
/// `stop` ends the list early, before the token it accepts.
pub(crate) fn params(
    state: &mut ParseState<'_>,
    stop: impl Fn(&ParseState<'_>) -> bool,
) -> Result<Vec<Option<Expr>>, ParseError> {
    let mut params = Vec::new();
    while state.continue_line() && !stop(state) {
        if is_delimiter(state) {
            params.push(None);
            state.advance();
            continue;
        }
        params.push(param(state, &stop)?);
        if is_delimiter(state) {
            state.advance();
        }
    }
    Ok(params)
}

fn param(
    state: &mut ParseState<'_>,
    stop: &impl Fn(&ParseState<'_>) -> bool,
) -> Result<Option<Expr>, ParseError> {
    if is_forced_expression(state) {
        state.advance();
        let expr = expression::expression(state, COMMA)?.ok_or_else(|| state.error())?;
        if !state.eol() && !is_delimiter(state) && !stop(state) {
            return Err(state.error());
        }
        return Ok(Some(expr));
    }

    Ok(literal(state, |s| is_delimiter(s) || stop(s)).map(Expr::LegacyLiteral))
}

/// `%` followed by whitespace starts an expression parameter.
fn is_forced_expression(state: &ParseState<'_>) -> bool {
    let Some(token) = state.current() else {
        return false;
    };
    token.text == "%"
        && !state.joiner(0).is_some_and(|j| j.literal_percent)
        && state.token(1).is_none_or(|next| !token.touches(next))
}

/// A `,` that separates parameters.
fn is_delimiter(state: &ParseState<'_>) -> bool {
    let Some(token) = state.current() else {
        return false;
    };
    if token.text != "," || !state.continue_line() {
        return false;
    }
    if state.joiner(0).is_some_and(|j| j.literal_comma) {
        return false;
    }
    !is_escaped(state)
}

/// The current token follows an odd run of adjacent backticks.
fn is_escaped(state: &ParseState<'_>) -> bool {
    if state.joiner(0).is_some_and(|j| j.literal_accent) {
        return false;
    }
    let tokens = &state.tokens()[..state.pos];
    let mut next = state.current();
    let mut run = 0;
    for token in tokens.iter().rev() {
        if token.text != "`" || !next.is_some_and(|next| token.touches(next)) {
            break;
        }
        run += 1;
        next = Some(token);
    }
    run % 2 == 1
}

/// Collect tokens up to the end of the logical line, or until `stop`, as a
/// legacy literal.
pub(crate) fn literal(
    state: &mut ParseState<'_>,
    stop: impl Fn(&ParseState<'_>) -> bool,
) -> Option<LegacyLiteral> {
    let first = state.pos;
    while state.continue_line() && !stop(state) {
        state.advance();
    }
    if state.pos == first {
        return None;
    }
    Some(assemble(state, first, state.pos - 1))
}

/// Build a legacy literal from the token range `first..=last`.
pub(crate) fn assemble(state: &ParseState<'_>, first: usize, last: usize) -> LegacyLiteral {
    let tokens = state.tokens();
    let source = state.source;

    let mut value = section_indent(state, first);
    let mut literal_accent = false;
    for index in first..=last {
        if index > first {
            value.push_str(&gap(state, index - 1, index));
        }
        value.push_str(&tokens[index].text);
        if let Some(j) = state.mark(index).joiner {
            literal_accent |= state.joiner_at(j).literal_accent;
        }
    }

    let start = tokens[first].span;
    let end = tokens[last].span.end;
    LegacyLiteral {
        value: if literal_accent { value } else { unescape(&value) },
        raw: source[start.start..end].to_string(),
        span: start.to(end),
    }
}

/// Indentation of the first section line when a literal starts there.
fn section_indent(state: &ParseState<'_>, first: usize) -> String {
    let Some(joiner) = state.mark(first).joiner.map(|j| state.joiner_at(j)) else {
        return String::new();
    };
    let tokens = state.tokens();
    let token = &tokens[first];
    let opens = first == 0 || tokens[first - 1].span.end <= joiner.start_token.span.start;
    if !opens || joiner.trim_left {
        return String::new();
    }
    let line_start = state.source[..token.span.start]
        .rfind(['\r', '\n'])
        .map_or(0, |at| at + 1);
    state.source[line_start..token.span.start].to_string()
}

/// Text standing between two consecutive tokens of a legacy literal.
fn gap(state: &ParseState<'_>, prev_index: usize, index: usize) -> String {
    let tokens = state.tokens();
    let (prev, token) = (&tokens[prev_index], &tokens[index]);
    let text = &state.source[prev.span.end..token.span.start];

    if prev.span.line == token.span.line {
        return text.to_string();
    }

    let joiner = state
        .mark(index)
        .joiner
        .or(state.mark(prev_index).joiner)
        .map(|j| state.joiner_at(j));
    joiner.map_or_else(|| " ".to_string(), |joiner| section_gap(state, joiner, prev_index, index))
}

fn section_gap(state: &ParseState<'_>, joiner: &Joiner, prev_index: usize, index: usize) -> String {
    let tokens = state.tokens();
    let (prev, token) = (&tokens[prev_index], &tokens[index]);
    let source = state.source;
    let opened = prev.span.end <= joiner.start_token.span.start;
    let closed = token.span.start >= joiner.end_token.span.end;

    let lines = split_lines(&source[prev.span.end..token.span.start]);
    let trailing = lines.first().copied().unwrap_or_default();
    let leading = lines.last().copied().unwrap_or_default();

    let trailing = if joiner.trim_comment {
        strip_comment(trailing)
    } else {
        trailing
    };
    let trailing = if joiner.trim_right {
        trailing.trim_end_matches([' ', '\t'])
    } else {
        trailing
    };
    let leading = if joiner.trim_left {
        leading.trim_start_matches([' ', '\t'])
    } else {
        leading
    };

    if opened {
        // Section text is appended to the line holding the command.
        return leading.to_string();
    }
    if closed {
        let after = &source[joiner.end_token.span.end..token.span.start];
        return format!("{trailing}{after}");
    }

    let mut out = String::from(trailing);
    for line in lines.iter().skip(1).take(lines.len().saturating_sub(2)) {
        if joiner.trim_comment && line.trim_start().starts_with(';') {
            continue;
        }
        out.push_str(&joiner.sep);
        out.push_str(joiner.trim_line(line));
    }
    out.push_str(&joiner.sep);
    out.push_str(leading);
    out
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Stmt};
    use crate::parser::parse;

    fn command(source: &str) -> crate::ast::CommandStatement {
        let script = parse(source).expect("should parse");
        match script.body.into_iter().next() {
            Some(Stmt::Command(cmd)) => cmd,
            other => panic!("expected command, got {other:?}"),
        }
    }

    fn values(cmd: &crate::ast::CommandStatement) -> Vec<Option<String>> {
        cmd.arguments
            .iter()
            .map(|arg| match arg {
                Some(Expr::LegacyLiteral(lit)) => Some(lit.value.clone()),
                Some(other) => Some(format!("{other:?}")),
                None => None,
            })
            .collect()
    }

    #[test]
    fn bare_command() {
        let cmd = command("ExitApp");
        assert_eq!(cmd.name.name, "ExitApp");
        assert!(cmd.arguments.is_empty());
    }

    #[test]
    fn comma_and_space_forms() {
        let cmd = command("MsgBox, Hello   world");
        assert_eq!(values(&cmd), [Some("Hello   world".to_string())]);

        let cmd = command("Sleep 100");
        assert_eq!(values(&cmd), [Some("100".to_string())]);
    }

    #[test]
    fn empty_slots() {
        let cmd = command("MsgBox,, title,, 5");
        assert_eq!(
            values(&cmd),
            [None, Some("title".into()), None, Some("5".into())]
        );
    }

    #[test]
    fn escaped_comma_is_literal() {
        let cmd = command("MsgBox, a`, b");
        assert_eq!(values(&cmd), [Some("a, b".to_string())]);
    }

    #[test]
    fn escaped_semicolon_is_text() {
        let cmd = command("MsgBox, 50`; percent ; note");
        assert_eq!(values(&cmd), [Some("50; percent".to_string())]);
    }

    #[test]
    fn comma_after_escaped_backtick_delimits() {
        let cmd = command("MsgBox, a``, b");
        assert_eq!(values(&cmd), [Some("a`".to_string()), Some("b".to_string())]);

        let cmd = command("MsgBox, a```, b");
        assert_eq!(values(&cmd), [Some("a`, b".to_string())]);
    }

    #[test]
    fn raw_keeps_source() {
        let cmd = command("Send {Enter}`n");
        let Some(Expr::LegacyLiteral(lit)) = &cmd.arguments[0] else {
            panic!("expected literal");
        };
        assert_eq!(lit.raw, "{Enter}`n");
        assert_eq!(lit.value, "{Enter}\n");
    }

    #[test]
    fn hash_directive() {
        let cmd = command("#Include lib.ahk");
        assert!(cmd.hash);
        assert_eq!(cmd.name.name, "Include");
        assert_eq!(cmd.span.start, 0);
        assert_eq!(values(&cmd), [Some("lib.ahk".to_string())]);
    }

    #[test]
    fn forced_expression() {
        let cmd = command("MsgBox % a + 1, b");
        assert!(matches!(cmd.arguments[0], Some(Expr::Binary(_))));
        assert_eq!(cmd.arguments.len(), 2);
    }

    #[test]
    fn forced_expression_must_end_at_delimiter() {
        assert!(parse("MsgBox % a b) c").is_err());
    }

    #[test]
    fn percent_deref_is_text() {
        let cmd = command("MsgBox %name%");
        assert_eq!(values(&cmd), [Some("%name%".to_string())]);
    }

    #[test]
    fn expression_syntax_is_not_a_command() {
        for source in ["a := 1", "a.b()", "f(x)", "a++", "a . b", "x ? y : z", "a += 2"] {
            let script = parse(source).expect("should parse");
            assert!(
                matches!(script.body[0], Stmt::Expression(_)),
                "{source} should be an expression"
            );
        }
    }

    #[test]
    fn expression_commands() {
        let cmd = command("return x + 1");
        assert!(matches!(cmd.arguments[0], Some(Expr::Binary(_))));

        let cmd = command("global a, b := 2");
        assert_eq!(cmd.arguments.len(), 2);

        let cmd = command("return");
        assert!(cmd.arguments.is_empty());
    }

    #[test]
    fn continuation_section_parameters() {
        let cmd = command("MsgBox,\n(\n  one\n  two\n)");
        assert_eq!(values(&cmd), [Some("  one\n  two".to_string())]);

        let cmd = command("MsgBox,\n( LTrim Join|\n  one\n  two\n)");
        assert_eq!(values(&cmd), [Some("one|two".to_string())]);
    }

    #[test]
    fn continuation_section_commas() {
        let cmd = command("MsgBox, 0, title,\n(\na, b\n)");
        assert_eq!(values(&cmd).len(), 4);

        let cmd = command("MsgBox, 0, title,\n( ,\na, b\n)");
        assert_eq!(values(&cmd).len(), 3);
        assert_eq!(values(&cmd)[2], Some("a, b".to_string()));
    }

    #[test]
    fn continuation_section_literal_accent() {
        let cmd = command("MsgBox,\n( `\na`nb\n)");
        assert_eq!(values(&cmd), [Some("a`nb".to_string())]);
    }

    #[test]
    fn operator_continued_line_joins_with_space() {
        let cmd = command("MsgBox, a\n. b");
        assert_eq!(values(&cmd), [Some("a . b".to_string())]);
    }
}
