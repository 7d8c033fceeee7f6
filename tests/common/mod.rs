#![allow(dead_code)]

use ahklint::visit::{NodeRef, walk};
use ahklint::{Diagnostic, LintOptions, Script, Stmt, lint, parse};

/// Parse or fail the test with the source in the message.
pub fn parse_ok(source: &str) -> Script {
    parse(source).unwrap_or_else(|e| panic!("failed to parse: {e}\n--- source ---\n{source}"))
}

/// The only statement of `source`.
pub fn single(source: &str) -> Stmt {
    let mut body = parse_ok(source).body;
    assert_eq!(body.len(), 1, "expected one statement in {source:?}");
    body.remove(0)
}

pub fn diagnostics(source: &str) -> Vec<Diagnostic> {
    lint(&LintOptions::new(source)).expect("lint failed")
}

pub fn codes(source: &str) -> Vec<&'static str> {
    diagnostics(source).iter().map(|d| d.code).collect()
}

/// Every node span lies within its parent's span and is well-formed.
pub fn assert_spans_nest(script: &Script) {
    walk(NodeRef::Script(script), &mut |node| {
        let span = node.span();
        assert!(span.start <= span.end, "inverted span on {node:?}");
        for child in node.children() {
            let inner = child.span();
            assert!(
                span.start <= inner.start && inner.end <= span.end,
                "child {child:?} escapes parent {node:?}"
            );
        }
    });
}

/// A script touching most of the grammar.
pub const SAMPLE: &str = r#"#NoEnv
#SingleInstance, Force
SetWorkingDir %A_ScriptDir%

; greeting shown on start
greeting := "Hello, " . A_UserName
MsgBox, % greeting

/*
  Hotkeys
*/
^!r::Reload

#n::
    Run, notepad.exe
return

::btw::by the way
:*X:td::Send, %A_YYYY%-%A_MM%-%A_DD%

Add(a, b := 1) {
    return a + b
}

Counter:
Loop, 3
{
    if (A_Index > 1)
        count += A_Index
    else
        count := 1
}

for key, value in {a: 1, b: 2}
    total := total + value

try {
    Process()
} catch e {
    MsgBox % e.Message
}

text =
(
    line one
    line two
)
"#;
