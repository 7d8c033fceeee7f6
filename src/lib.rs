//! AutoHotkey tokenizer, parser, and linter.
//!
//! Source text goes through three stages: [`tokenize`] splits it into
//! tokens, [`preprocess`] strips comments and marks continuation sections,
//! and [`parse`] builds a typed AST. [`lint`] runs rules over that AST.
//!
//! # Quick start
//!
//! ## Parse a script
//!
//! ```
//! use ahklint::{Stmt, parse};
//!
//! let script = parse("MsgBox, Hello\nx := 1 + 2").unwrap();
//! assert_eq!(script.body.len(), 2);
//! assert!(matches!(script.body[0], Stmt::Command(_)));
//! ```
//!
//! ## Lint a script
//!
//! ```
//! use ahklint::{LintOptions, lint};
//!
//! let diagnostics = lint(&LintOptions::new("a = b")).unwrap();
//! assert_eq!(diagnostics[0].code, "no-legacy-assign");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod joiner;
pub mod lexer;
pub mod lint;
pub mod options;
pub mod parser;
pub mod report;
pub mod token;
pub mod visit;

pub use ast::{Expr, Script, Stmt};
pub use joiner::{Joiner, TokenStream, preprocess};
pub use lexer::tokenize;
pub use lint::{Diagnostic, Rule, lint};
pub use options::LintOptions;
pub use parser::{ParseError, ParseErrorKind, parse, parse_expression};
pub use token::{Span, Token, TokenKind};
