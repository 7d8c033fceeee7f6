/// Source location of a token or AST node.
///
/// `start` and `end` are byte offsets into the source; `line` and `col`
/// are zero-based and `col` counts characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    /// Span starting where `self` starts and ending at `end`.
    #[must_use]
    pub const fn to(self, end: usize) -> Self {
        Self {
            start: self.start,
            end,
            line: self.line,
            col: self.col,
        }
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Decimal or hexadecimal number.
    Number,
    /// `true` / `false`, any case.
    Boolean,
    /// Identifier-like run of `\w` characters.
    Word,
    /// Line comment (`; ...`) or block comment (`/* ... */`).
    Comment,
    /// Operator, keyword operator (`and`, `not`, ...) or any other character.
    Symbol,
    /// Double-quoted string, quotes included.
    String,
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// First token of its physical line.
    pub sol: bool,
}

impl Token {
    /// Case-insensitive comparison against the token text.
    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.text.eq_ignore_ascii_case(text)
    }

    /// True when `next` starts exactly where this token ends.
    #[must_use]
    pub const fn touches(&self, next: &Self) -> bool {
        self.span.end == next.span.start
    }
}
