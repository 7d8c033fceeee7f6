//! Property-based tests with proptest.
//!
//! Scripts are assembled from random statement templates. Every generated
//! script must parse, parse to the same tree every time, and produce spans
//! that nest inside their parents. Arbitrary text must never panic the
//! tokenizer, the parser or the linter.

mod common;

use ahklint::{LintOptions, lint, parse, tokenize};
use common::assert_spans_nest;
use proptest::prelude::*;

// -- Leaf strategies --

/// Identifier that is neither a flow keyword nor a word operator.
fn identifier() -> impl Strategy<Value = String> {
    "v[a-z0-9_]{0,8}"
}

fn number() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10_000).prop_map(|n| n.to_string()),
        (0u32..0xFFFF).prop_map(|n| format!("0x{n:X}")),
    ]
}

/// Quoted string without quotes, escapes or newlines.
fn string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:]{0,12}".prop_map(|s| format!("\"{s}\""))
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![identifier(), number(), string()]
}

fn operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["+", "-", "*", "/", "//", ".", "=", "==", "!=", "<", ">=", "and", "or", "&&"])
}

/// Expression of up to four operands joined by binary operators.
fn expression() -> impl Strategy<Value = String> {
    (operand(), prop::collection::vec((operator(), operand()), 0..4)).prop_map(|(first, rest)| {
        rest.into_iter()
            .fold(first, |acc, (op, rhs)| format!("{acc} {op} {rhs}"))
    })
}

/// Unquoted command parameter text.
fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 .]{0,12}".prop_map(|s| s.trim_end().to_string())
}

/// One statement, possibly spanning several lines.
fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (identifier(), expression()).prop_map(|(name, expr)| format!("{name} := {expr}")),
        (identifier(), text()).prop_map(|(name, value)| format!("{name} = {value}")),
        text().prop_map(|value| format!("MsgBox, {value}")),
        (expression(), identifier()).prop_map(|(test, name)| format!("if ({test})\n    {name}++")),
        (expression(), identifier(), identifier()).prop_map(|(test, a, b)| {
            format!("if ({test}) {{\n    {a} := 1\n}} else {{\n    {b} := 2\n}}")
        }),
        (1u32..100, identifier()).prop_map(|(n, name)| format!("Loop, {n}\n{{\n    {name} += 1\n}}")),
        (identifier(), identifier(), expression())
            .prop_map(|(k, v, expr)| format!("for {k}, {v} in {expr}\n    MsgBox, x")),
        (identifier(), identifier(), expression())
            .prop_map(|(f, a, expr)| format!("{f}({a}) {{\n    return {expr}\n}}")),
        prop::sample::select(vec!["a", "F1", "Space", "Numpad3"])
            .prop_map(|key| format!("^{key}::MsgBox, hi")),
        text().prop_map(|value| format!("::abbr::{value}")),
    ]
}

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 0..8).prop_map(|stmts| stmts.join("\n"))
}

// -- Properties --

proptest! {
    #[test]
    fn generated_scripts_parse(source in script()) {
        let script = parse(&source);
        prop_assert!(script.is_ok(), "failed on:\n{source}\n{script:?}");
    }

    #[test]
    fn parsing_is_deterministic(source in script()) {
        let first = parse(&source);
        let second = parse(&source);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn spans_nest(source in script()) {
        if let Ok(script) = parse(&source) {
            assert_spans_nest(&script);
        }
    }

    #[test]
    fn statement_count_matches_generated(stmts in prop::collection::vec(statement(), 1..6)) {
        let source = stmts.join("\n");
        let script = parse(&source).map_err(|e| TestCaseError::fail(format!("{e}\n{source}")))?;
        prop_assert_eq!(script.body.len(), stmts.len());
    }

    #[test]
    fn token_spans_slice_the_source(source in "\\PC{0,64}") {
        for token in tokenize(&source) {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert_eq!(&source[token.span.start..token.span.end], token.text.as_str());
        }
    }

    #[test]
    fn arbitrary_text_never_panics(source in "[ -~\\n\\t]{0,80}") {
        let _ = parse(&source);
        let diagnostics = lint(&LintOptions::new(source.clone()));
        prop_assert!(diagnostics.is_ok());
        let diagnostics = diagnostics.unwrap_or_default();
        prop_assert!(
            diagnostics.windows(2).all(|w| (w[0].start, w[0].end) <= (w[1].start, w[1].end))
        );
    }
}
