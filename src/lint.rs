//! Rule-based checks over a parsed script.

use crate::ast::{Expr, Script};
use crate::options::LintOptions;
use crate::parser::{ParseError, parse};
use crate::token::Span;
use crate::visit::{NodeRef, NodeType, walk};

/// Code of the diagnostic reported for a parse error.
pub const SYNTAX_ERROR: &str = "syntax-error";

/// A problem found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Rule code, e.g. `no-legacy-assign`.
    pub code: &'static str,
    pub message: String,
    /// Byte offsets of the offending range.
    pub start: usize,
    pub end: usize,
    /// Zero-based position of `start`.
    pub line: usize,
    pub col: usize,
}

impl Diagnostic {
    fn new(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            start: span.start,
            end: span.end,
            line: span.line,
            col: span.col,
        }
    }
}

/// A check that runs on every node of one type.
pub trait Rule {
    fn code(&self) -> &'static str;

    fn node_type(&self) -> NodeType;

    /// Inspect `node`, returning a message when the rule fires.
    fn check(&self, node: NodeRef<'_>) -> Option<String>;
}

struct EmptyFile;

impl Rule for EmptyFile {
    fn code(&self) -> &'static str {
        "empty-file"
    }

    fn node_type(&self) -> NodeType {
        NodeType::Script
    }

    fn check(&self, node: NodeRef<'_>) -> Option<String> {
        match node {
            NodeRef::Script(Script { body, .. }) if body.is_empty() => {
                Some("empty file".to_string())
            }
            _ => None,
        }
    }
}

struct NoLegacyAssign;

impl Rule for NoLegacyAssign {
    fn code(&self) -> &'static str {
        "no-legacy-assign"
    }

    fn node_type(&self) -> NodeType {
        NodeType::LegacyAssignmentExpression
    }

    fn check(&self, node: NodeRef<'_>) -> Option<String> {
        matches!(node, NodeRef::Expr(Expr::LegacyAssignment(_)))
            .then(|| "avoid legacy assignment".to_string())
    }
}

/// All built-in rules.
#[must_use]
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(EmptyFile), Box::new(NoLegacyAssign)]
}

/// Parse `options.code` and run every enabled rule over it.
///
/// Diagnostics are ordered by start offset, then end offset.
///
/// # Errors
///
/// Returns the [`ParseError`] when the source does not parse and
/// `throw_parse_error` is set; otherwise the error is reported as a
/// `syntax-error` diagnostic.
#[tracing::instrument(skip_all, fields(code_len = options.code.len()))]
pub fn lint(options: &LintOptions) -> Result<Vec<Diagnostic>, ParseError> {
    let mut diagnostics = Vec::new();

    match parse(&options.code) {
        Ok(script) => run_rules(&script, options, &mut diagnostics),
        Err(err) if options.throw_parse_error => return Err(err),
        Err(err) => {
            tracing::debug!(%err, "captured syntax error");
            if options.is_enabled(SYNTAX_ERROR) {
                diagnostics.push(Diagnostic::new(SYNTAX_ERROR, err.kind.to_string(), err.span));
            }
        }
    }

    diagnostics.sort_by_key(|d| (d.start, d.end));
    Ok(diagnostics)
}

fn run_rules(script: &Script, options: &LintOptions, diagnostics: &mut Vec<Diagnostic>) {
    let rules: Vec<_> = rules()
        .into_iter()
        .filter(|rule| options.is_enabled(rule.code()))
        .collect();

    walk(NodeRef::Script(script), &mut |node| {
        let node_type = node.node_type();
        for rule in rules.iter().filter(|rule| rule.node_type() == node_type) {
            if let Some(message) = rule.check(node) {
                tracing::trace!(code = rule.code(), "rule fired");
                diagnostics.push(Diagnostic::new(rule.code(), message, node.span()));
            }
        }
    });
}
