use crate::ast::{
    ArrayExpression, BinaryExpression, CallExpression, ConditionalExpression, Expr,
    GroupExpression, Identifier, ImplicitConcatExpression, Literal, LiteralValue,
    MemberExpression, ObjectExpression, Property, UnaryExpression, VariadicExpression,
};
use crate::token::{Token, TokenKind};

use super::flow::Keyword;
use super::state::ParseState;
use super::{ParseError, ParseResult, unescape};

/// Floor that admits every operator.
pub(crate) const LOWEST: i32 = -1;
/// Precedence of `,`; list elements are parsed at this floor.
pub(crate) const COMMA: i32 = 0;
const TERNARY: i32 = 2;
/// Precedence of `.`, shared by implicit concatenation.
const CONCAT: i32 = 9;
/// Floor that admits no binary operator, used for object keys.
const HIGHEST: i32 = i32::MAX;

/// Which operator table to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fixity {
    Prefix,
    Infix,
}

const PREFIX: &[(&str, i32)] = &[
    ("not", 5),
    ("-", 14),
    ("!", 14),
    ("~", 14),
    ("&", 14),
    ("*", 14),
    ("++", 16),
    ("--", 16),
    ("new", 17),
];

const INFIX: &[(&str, i32)] = &[
    (",", 0),
    (":=", 1),
    ("+=", 1),
    ("-=", 1),
    ("*=", 1),
    ("/=", 1),
    ("//=", 1),
    (".=", 1),
    ("|=", 1),
    ("&=", 1),
    ("^=", 1),
    (">>=", 1),
    ("<<=", 1),
    ("or", 3),
    ("||", 3),
    ("and", 4),
    ("&&", 4),
    ("=", 6),
    ("==", 6),
    ("<>", 6),
    ("!=", 6),
    (">", 7),
    ("<", 7),
    (">=", 7),
    ("<=", 7),
    ("~=", 8),
    (".", 9),
    ("&", 10),
    ("^", 10),
    ("|", 10),
    ("<<", 11),
    (">>", 11),
    ("+", 12),
    ("-", 12),
    ("*", 13),
    ("/", 13),
    ("//", 13),
    ("**", 15),
];

/// Binding precedence of `text` used as a prefix or infix operator.
pub(crate) fn precedence(fixity: Fixity, text: &str) -> Option<i32> {
    let table = match fixity {
        Fixity::Prefix => PREFIX,
        Fixity::Infix => INFIX,
    };
    table
        .iter()
        .find(|(op, _)| op.eq_ignore_ascii_case(text))
        .map(|&(_, prec)| prec)
}

/// Assignment-like operators group to the right.
fn is_right_associative(text: &str) -> bool {
    let equality = precedence(Fixity::Infix, "==").unwrap_or(i32::MAX);
    text.ends_with('=') && precedence(Fixity::Infix, text).is_some_and(|p| p < equality)
}

/// Parse an expression whose binary operators all bind tighter than
/// `floor`.
pub(crate) fn expression(state: &mut ParseState<'_>, floor: i32) -> ParseResult<Expr> {
    let Some(left) = state.attempt(primary)? else {
        return Ok(None);
    };
    climb(state, left, floor).map(Some)
}

/// Extend `left` with postfix, infix, ternary and implicit-concatenation
/// continuations.
pub(crate) fn climb(state: &mut ParseState<'_>, mut left: Expr, floor: i32) -> Result<Expr, ParseError> {
    loop {
        if state.eol() {
            break;
        }
        let Some(token) = state.current() else {
            break;
        };
        let glued = !state.sol();
        let text = token.text.as_str();

        let member = state
            .token(1)
            .filter(|next| next.kind == TokenKind::Word && token.touches(next));
        if let (".", true, Some(name)) = (text, glued, member) {
            state.pos += 2;
            let property = identifier(name);
            let span = left.span().to(property.span.end);
            left = Expr::Member(MemberExpression {
                object: Box::new(left),
                property: Box::new(Expr::Identifier(property)),
                computed: false,
                span,
            });
            continue;
        }

        if text == "[" && glued {
            state.advance();
            let property = expression(state, LOWEST)?.ok_or_else(|| state.error())?;
            state.expect("]")?;
            let span = state.span_from(left.span());
            left = Expr::Member(MemberExpression {
                object: Box::new(left),
                property: Box::new(property),
                computed: true,
                span,
            });
            continue;
        }

        if text == "(" && state.previous().is_some_and(|prev| prev.touches(token)) {
            state.advance();
            let arguments = list(state)?;
            state.expect(")")?;
            let span = state.span_from(left.span());
            left = Expr::Call(CallExpression {
                callee: Box::new(left),
                arguments,
                span,
            });
            continue;
        }

        if let Some(prec) = precedence(Fixity::Infix, text) {
            if prec > floor || (prec == floor && is_right_associative(text)) {
                let checkpoint = state.pos;
                state.advance();
                if let Some(right) = expression(state, prec)? {
                    let span = left.span().to(right.span().end);
                    left = Expr::Binary(BinaryExpression {
                        operator: text.to_string(),
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    });
                    continue;
                }
                state.pos = checkpoint;
            }
        }

        if (text == "++" || text == "--") && glued {
            state.advance();
            let span = left.span().to(token.span.end);
            left = Expr::Unary(UnaryExpression {
                operator: text.to_string(),
                argument: Box::new(left),
                prefix: false,
                span,
            });
            continue;
        }

        if text == "?" && floor < TERNARY {
            state.advance();
            let consequent = expression(state, COMMA)?.ok_or_else(|| state.error())?;
            state.expect(":")?;
            let alternate = expression(state, TERNARY - 1)?.ok_or_else(|| state.error())?;
            let span = left.span().to(alternate.span().end);
            left = Expr::Conditional(ConditionalExpression {
                test: Box::new(left),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                span,
            });
            continue;
        }

        if floor < CONCAT && glued {
            if let Some(right) = state.attempt(|s| expression(s, CONCAT))? {
                let span = left.span().to(right.span().end);
                left = Expr::ImplicitConcat(ImplicitConcatExpression {
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                });
                continue;
            }
        }

        break;
    }

    Ok(left)
}

fn primary(state: &mut ParseState<'_>) -> ParseResult<Expr> {
    let Some(token) = state.current() else {
        return Ok(None);
    };

    match token.kind {
        TokenKind::Word if !Keyword::is_clause(token) => {
            state.advance();
            Ok(Some(Expr::Identifier(identifier(token))))
        }
        TokenKind::Number | TokenKind::Boolean | TokenKind::String => {
            let value = literal_value(state, token)?;
            state.advance();
            Ok(Some(Expr::Literal(Literal {
                value,
                raw: token.text.clone(),
                span: token.span,
            })))
        }
        TokenKind::Symbol => {
            if let Some(prec) = precedence(Fixity::Prefix, &token.text) {
                let checkpoint = state.pos;
                state.advance();
                if let Some(argument) = expression(state, prec)? {
                    let span = token.span.to(argument.span().end);
                    return Ok(Some(Expr::Unary(UnaryExpression {
                        operator: token.text.clone(),
                        argument: Box::new(argument),
                        prefix: true,
                        span,
                    })));
                }
                state.pos = checkpoint;
            }

            match token.text.as_str() {
                "(" => group(state).map(Some),
                "[" => {
                    state.advance();
                    let elements = list(state)?;
                    state.expect("]")?;
                    Ok(Some(Expr::Array(ArrayExpression {
                        elements,
                        span: state.span_from(token.span),
                    })))
                }
                "{" if !state.ends_line(0) => object(state).map(Some),
                _ => Ok(None),
            }
        }
        TokenKind::Word | TokenKind::Comment => Ok(None),
    }
}

/// `( expr )` at the cursor.
pub(crate) fn group(state: &mut ParseState<'_>) -> Result<Expr, ParseError> {
    let open = state.expect("(")?;
    let expression = expression(state, LOWEST)?.ok_or_else(|| state.error())?;
    state.expect(")")?;
    Ok(Expr::Group(GroupExpression {
        expression: Box::new(expression),
        span: state.span_from(open.span),
    }))
}

fn object(state: &mut ParseState<'_>) -> Result<Expr, ParseError> {
    let open = state.expect("{")?;
    let mut properties = Vec::new();

    if state.current().is_some_and(|t| t.text == "}") {
        state.advance();
        return Ok(Expr::Object(ObjectExpression {
            properties,
            span: state.span_from(open.span),
        }));
    }

    loop {
        let key = expression(state, HIGHEST)?.ok_or_else(|| state.error())?;
        state.expect(":")?;
        let value = expression(state, COMMA)?.ok_or_else(|| state.error())?;
        let span = key.span().to(value.span().end);
        properties.push(Property { key, value, span });

        match state.current() {
            Some(token) if token.text == "," => {
                state.advance();
            }
            Some(token) if token.text == "}" => {
                state.advance();
                break;
            }
            _ => return Err(state.error()),
        }
    }

    Ok(Expr::Object(ObjectExpression {
        properties,
        span: state.span_from(open.span),
    }))
}

/// Comma-separated elements up to, not including, the closing bracket.
///
/// Empty slots become `None` and a trailing `*` marks an element as
/// variadic.
pub(crate) fn list(state: &mut ParseState<'_>) -> Result<Vec<Option<Expr>>, ParseError> {
    let mut elements = Vec::new();
    let mut element: Option<Expr> = None;
    let mut seen = false;

    while let Some(token) = state.current() {
        if token.text == "," {
            elements.push(element.take());
            state.advance();
            seen = true;
            continue;
        }

        if token.text == "*" {
            if let Some(argument) = element.take() {
                if matches!(argument, Expr::Variadic(_)) {
                    element = Some(argument);
                    break;
                }
                state.advance();
                let span = argument.span().to(token.span.end);
                element = Some(Expr::Variadic(VariadicExpression {
                    argument: Box::new(argument),
                    span,
                }));
                continue;
            }
        }

        if element.is_some() {
            break;
        }
        match expression(state, COMMA)? {
            Some(expr) => element = Some(expr),
            None => break,
        }
        seen = true;
    }

    if seen {
        elements.push(element);
    }
    Ok(elements)
}

pub(crate) fn identifier(token: &Token) -> Identifier {
    Identifier {
        name: token.text.clone(),
        span: token.span,
    }
}

fn literal_value(state: &ParseState<'_>, token: &Token) -> Result<LiteralValue, ParseError> {
    let text = token.text.as_str();
    match token.kind {
        TokenKind::Boolean => Ok(LiteralValue::Boolean(text.starts_with(['t', 'T']))),
        TokenKind::String => {
            let value = match state.joiner(0).and_then(|j| j.literal.as_deref()) {
                Some(joined) => unescape(joined),
                None => unescape(&text[1..text.len() - 1]),
            };
            Ok(LiteralValue::String(value))
        }
        _ => number(text)
            .map(LiteralValue::Number)
            .ok_or_else(|| ParseError::at(token)),
    }
}

fn number(text: &str) -> Option<f64> {
    match text.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => text[2..]
            .chars()
            .map(|c| c.to_digit(16))
            .try_fold(0.0, |acc, digit| digit.map(|d| acc * 16.0 + f64::from(d))),
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn parse(source: &str) -> Expr {
        parse_expression(source)
            .expect("should parse")
            .expect("should match")
    }

    fn binary(expr: &Expr) -> (&str, &Expr, &Expr) {
        match expr {
            Expr::Binary(b) => (b.operator.as_str(), &b.left, &b.right),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn operator_lookup() {
        assert_eq!(precedence(Fixity::Prefix, "NOT"), Some(5));
        assert_eq!(precedence(Fixity::Infix, "And"), Some(4));
        assert_eq!(precedence(Fixity::Infix, "~="), Some(8));
        assert_eq!(precedence(Fixity::Infix, "!"), None);
        assert_eq!(precedence(Fixity::Prefix, "+"), None);
    }

    #[test]
    fn right_associativity() {
        assert!(is_right_associative(":="));
        assert!(is_right_associative(">>="));
        assert!(!is_right_associative("="));
        assert!(!is_right_associative("<="));
    }

    #[test]
    fn numbers() {
        assert_eq!(number("0x1F"), Some(31.0));
        assert_eq!(number("0XfF"), Some(255.0));
        assert_eq!(number("3.5"), Some(3.5));
        assert_eq!(number("42"), Some(42.0));
    }

    #[test]
    fn precedence_climbing() {
        let expr = parse("1 + 2 * 3");
        let (op, left, right) = binary(&expr);
        assert_eq!(op, "+");
        assert!(matches!(left, Expr::Literal(_)));
        assert_eq!(binary(right).0, "*");
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("a := b := c");
        let (op, left, right) = binary(&expr);
        assert_eq!(op, ":=");
        assert!(matches!(left, Expr::Identifier(i) if i.name == "a"));
        assert_eq!(binary(right).0, ":=");
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("a - b - c");
        let (_, left, right) = binary(&expr);
        assert_eq!(binary(left).0, "-");
        assert!(matches!(right, Expr::Identifier(_)));
    }

    #[test]
    fn postfix_increment_advances() {
        let expr = parse("i++ + 1");
        let (op, left, _) = binary(&expr);
        assert_eq!(op, "+");
        assert!(matches!(left, Expr::Unary(u) if !u.prefix && u.operator == "++"));
    }

    #[test]
    fn prefix_falls_through_without_operand() {
        assert!(parse_expression("-").is_err());
        let expr = parse("-x");
        assert!(matches!(expr, Expr::Unary(u) if u.prefix));
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let expr = parse("a ? b : c ? d : e");
        let Expr::Conditional(cond) = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*cond.alternate, Expr::Conditional(_)));
    }

    #[test]
    fn ternary_missing_colon_is_fatal() {
        assert!(parse_expression("a ? b").is_err());
    }

    #[test]
    fn member_and_call_chain() {
        let expr = parse("obj.method(1, , x*)[0]");
        let Expr::Member(index) = expr else {
            panic!("expected member");
        };
        assert!(index.computed);
        let Expr::Call(call) = *index.object else {
            panic!("expected call");
        };
        assert_eq!(call.arguments.len(), 3);
        assert!(call.arguments[1].is_none());
        assert!(matches!(call.arguments[2], Some(Expr::Variadic(_))));
        assert!(matches!(*call.callee, Expr::Member(ref m) if !m.computed));
    }

    #[test]
    fn spaced_paren_is_not_a_call() {
        let expr = parse("f (x)");
        assert!(matches!(expr, Expr::ImplicitConcat(_)));
    }

    #[test]
    fn implicit_concatenation() {
        let expr = parse("a b");
        let Expr::ImplicitConcat(concat) = expr else {
            panic!("expected implicit concat");
        };
        assert!(matches!(*concat.left, Expr::Identifier(ref i) if i.name == "a"));
        assert!(matches!(*concat.right, Expr::Identifier(ref i) if i.name == "b"));
        assert_eq!(concat.span.start, 0);
        assert_eq!(concat.span.end, 3);
    }

    #[test]
    fn concatenation_binds_like_dot() {
        let expr = parse("x := \"a\" b + 1");
        let (op, _, right) = binary(&expr);
        assert_eq!(op, ":=");
        assert!(matches!(right, Expr::ImplicitConcat(c) if matches!(*c.right, Expr::Binary(_))));
    }

    #[test]
    fn group_requires_expression() {
        assert!(parse_expression("()").is_err());
        assert!(parse_expression("(a").is_err());
        assert!(matches!(parse("(a)"), Expr::Group(_)));
    }

    #[test]
    fn arrays_and_objects() {
        let Expr::Array(array) = parse("[1, 2, 3]") else {
            panic!("expected array");
        };
        assert_eq!(array.elements.len(), 3);

        let Expr::Object(object) = parse("{a: 1, \"b\": x + 1}") else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 2);
        assert!(matches!(object.properties[1].value, Expr::Binary(_)));

        assert!(matches!(parse("{}"), Expr::Object(o) if o.properties.is_empty()));
        assert!(parse_expression("{a: 1,}").is_err());
        assert!(parse_expression("{a 1}").is_err());
    }

    #[test]
    fn empty_array() {
        let Expr::Array(array) = parse("[]") else {
            panic!("expected array");
        };
        assert!(array.elements.is_empty());
    }

    #[test]
    fn literals() {
        let Expr::Literal(lit) = parse("\"a`tb\"\"c\"") else {
            panic!("expected literal");
        };
        assert_eq!(lit.value.as_str(), Some("a\tb\"c"));

        assert!(matches!(parse("True"), Expr::Literal(Literal { value: LiteralValue::Boolean(true), .. })));
        assert!(matches!(parse("0x10"), Expr::Literal(Literal { value: LiteralValue::Number(n), .. }) if (n - 16.0).abs() < f64::EPSILON));
    }

    #[test]
    fn word_operators() {
        let expr = parse("not a and b or c");
        let (op, left, _) = binary(&expr);
        assert_eq!(op, "or");
        let (op, left, _) = binary(left);
        assert_eq!(op, "and");
        assert!(matches!(left, Expr::Unary(u) if u.operator == "not"));
    }

    #[test]
    fn comma_operator() {
        let expr = parse("a := 1, b := 2");
        assert_eq!(binary(&expr).0, ",");
    }

    #[test]
    fn continuation_line_operator() {
        let expr = parse("a\n. b\n|| c");
        assert_eq!(binary(&expr).0, "||");
    }

    #[test]
    fn new_line_ends_expression() {
        assert!(parse_expression("a\nb").is_err());
    }

    #[test]
    fn joined_string_literal() {
        let Expr::Binary(assign) = parse("x := \"\n(\none\ntwo\n)\"") else {
            panic!("expected assignment");
        };
        let Expr::Literal(lit) = *assign.right else {
            panic!("expected literal");
        };
        assert_eq!(lit.value.as_str(), Some("one\ntwo"));
    }
}
