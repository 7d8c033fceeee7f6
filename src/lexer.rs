use crate::token::{Span, Token, TokenKind};

/// Multi-character operators, longest first so that the first prefix
/// match is also the longest one.
const OPERATORS: &[&str] = &[
    "//=", ">>=", "<<=", "++", "--", "**", "//", "<<", ">>", "~=", "<=", ">=", "==", "<>", "!=",
    "&&", "||", ":=", "+=", "-=", "*=", "/=", ".=", "|=", "&=", "^=",
];

/// Words that the grammar treats as operators rather than identifiers.
const WORD_OPERATORS: &[&str] = &["new", "not", "and", "or"];

/// Tokenize an AutoHotkey source string.
///
/// Tokenization never fails: a character that cannot start any other
/// token becomes a one-character [`TokenKind::Symbol`]. Newlines and
/// horizontal whitespace only drive line/column bookkeeping.
#[tracing::instrument(skip_all, fields(source_len = input.len()))]
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let start = if input.starts_with('\u{FEFF}') {
        '\u{FEFF}'.len_utf8()
    } else {
        0
    };
    let tokens = Lexer::new(input, start, 0, 0, true).run();
    tracing::trace!(count = tokens.len(), "tokenized");
    tokens
}

/// Tokenize from byte offset `start` up to the end of that physical line.
///
/// Used when part of a line has to be re-read after a quoted string was
/// continued through a continuation section. None of the produced tokens
/// is marked as starting a line.
pub(crate) fn tokenize_line(input: &str, start: usize, line: usize, col: usize) -> Vec<Token> {
    Lexer::new(input, start, line, col, false).stop_at_newline().run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    sol: bool,
    single_line: bool,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str, pos: usize, line: usize, col: usize, sol: bool) -> Self {
        Self {
            input,
            pos,
            line,
            col,
            sol,
            single_line: false,
        }
    }

    const fn stop_at_newline(mut self) -> Self {
        self.single_line = true;
        self
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            match ch {
                '\r' | '\n' => {
                    if self.single_line {
                        break;
                    }
                    self.newline();
                }
                c if c.is_whitespace() => self.skip_whitespace(),
                _ => tokens.push(self.read_token()),
            }
        }

        tokens
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn newline(&mut self) {
        let crlf = self.rest().starts_with("\r\n");
        self.pos += if crlf { 2 } else { 1 };
        self.line += 1;
        self.col = 0;
        self.sol = true;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\r' || c == '\n' || !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
            self.col += 1;
        }
    }

    /// `;` opens a comment at the start of a line or after whitespace.
    fn comment_allowed(&self) -> bool {
        self.sol
            || self.input[..self.pos]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace)
    }

    fn read_token(&mut self) -> Token {
        let start = self.pos;
        let kind = self.scan();
        let text = &self.input[start..self.pos];

        let token = Token {
            kind,
            text: text.to_string(),
            span: Span {
                start,
                end: self.pos,
                line: self.line,
                col: self.col,
            },
            sol: self.sol,
        };

        self.col += text.chars().count();
        self.sol = false;
        token
    }

    /// Advance past one token and classify it.
    fn scan(&mut self) -> TokenKind {
        let rest = self.rest();

        if let Some(len) = number_len(rest) {
            self.pos += len;
            return TokenKind::Number;
        }

        let word = rest.bytes().take_while(|b| is_word_byte(*b)).count();
        if word > 0 {
            let text = &rest[..word];
            let after_word_char = self.input[..self.pos]
                .bytes()
                .next_back()
                .is_some_and(is_word_byte);
            self.pos += word;
            if !after_word_char && (text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")) {
                return TokenKind::Boolean;
            }
            if WORD_OPERATORS.iter().any(|op| text.eq_ignore_ascii_case(op)) {
                return TokenKind::Symbol;
            }
            return TokenKind::Word;
        }

        if rest.starts_with(';') && self.comment_allowed() {
            self.pos += rest.find(['\r', '\n']).unwrap_or(rest.len());
            return TokenKind::Comment;
        }

        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.len();
            return TokenKind::Symbol;
        }

        if let Some(len) = string_len(rest) {
            self.pos += len;
            return TokenKind::String;
        }

        // Fallback: any single character.
        self.pos += rest.chars().next().map_or(1, char::len_utf8);
        TokenKind::Symbol
    }
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length of a `0x` hex or `\d+(\.\d+)?` number at the start of `s`.
fn number_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
        let hex = bytes[2..].iter().take_while(|b| b.is_ascii_hexdigit()).count();
        if hex > 0 {
            return Some(2 + hex);
        }
    }

    let int = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if int == 0 {
        return None;
    }
    if bytes.get(int) == Some(&b'.') {
        let frac = bytes[int + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if frac > 0 {
            return Some(int + 1 + frac);
        }
    }
    Some(int)
}

/// Length of a double-quoted string at the start of `s`, or `None` when
/// the string is not closed on the same line.
fn string_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' if bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return Some(i + 1),
            b'\r' | b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn words_and_symbols() {
        assert_eq!(texts("x := y + 1"), ["x", ":=", "y", "+", "1"]);
        assert_eq!(
            kinds("x := y + 1"),
            [
                TokenKind::Word,
                TokenKind::Symbol,
                TokenKind::Word,
                TokenKind::Symbol,
                TokenKind::Number
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(texts("0x1F 3.14 42 1."), ["0x1F", "3.14", "42", "1", "."]);
        assert_eq!(kinds("0xZZ"), [TokenKind::Number, TokenKind::Word]);
    }

    #[test]
    fn number_then_word() {
        assert_eq!(texts("12abc"), ["12", "abc"]);
        assert_eq!(texts("abc12"), ["abc12"]);
    }

    #[test]
    fn booleans() {
        assert_eq!(kinds("true FALSE"), [TokenKind::Boolean, TokenKind::Boolean]);
        assert_eq!(kinds("trueish"), [TokenKind::Word]);
        assert_eq!(kinds("1true"), [TokenKind::Number, TokenKind::Word]);
    }

    #[test]
    fn word_operators_are_symbols() {
        assert_eq!(
            kinds("not a AND b"),
            [
                TokenKind::Symbol,
                TokenKind::Word,
                TokenKind::Symbol,
                TokenKind::Word
            ]
        );
        assert_eq!(kinds("notice"), [TokenKind::Word]);
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(texts("a //= b >>= c"), ["a", "//=", "b", ">>=", "c"]);
        assert_eq!(texts("a<>b"), ["a", "<>", "b"]);
        assert_eq!(texts("a<<b"), ["a", "<<", "b"]);
    }

    #[test]
    fn strings() {
        let tokens = tokenize(r#"x := "say ""hi""""#);
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].text, r#""say ""hi""""#);
    }

    #[test]
    fn unterminated_string_is_a_symbol() {
        let tokens = tokenize("x := \"abc\ny");
        assert_eq!(tokens[2].kind, TokenKind::Symbol);
        assert_eq!(tokens[2].text, "\"");
        assert_eq!(tokens[3].text, "abc");
    }

    #[test]
    fn comments() {
        let tokens = tokenize("a ; note\nb");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].text, "; note");
        assert_eq!(tokens[2].text, "b");
    }

    #[test]
    fn semicolon_needs_leading_whitespace() {
        assert_eq!(texts("a;b"), ["a", ";", "b"]);
        assert_eq!(texts("x`; y"), ["x", "`", ";", "y"]);
        assert_eq!(kinds("a\t; b")[1], TokenKind::Comment);
    }

    #[test]
    fn lines_and_columns() {
        let tokens = tokenize("a\r\n  bc d\n\ne");
        assert_eq!((tokens[0].span.line, tokens[0].span.col), (0, 0));
        assert_eq!((tokens[1].span.line, tokens[1].span.col), (1, 2));
        assert_eq!((tokens[2].span.line, tokens[2].span.col), (1, 5));
        assert_eq!((tokens[3].span.line, tokens[3].span.col), (3, 0));
        assert_eq!(tokens[1].span.start, 5);
        assert_eq!(tokens[1].span.end, 7);
    }

    #[test]
    fn start_of_line_flags() {
        let sol: Vec<bool> = tokenize("a b\nc\n  d e").iter().map(|t| t.sol).collect();
        assert_eq!(sol, [true, false, true, true, false]);
    }

    #[test]
    fn unknown_characters_never_fail() {
        let tokens = tokenize("@ é");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Symbol));
        assert_eq!(tokens[1].text, "é");
        assert_eq!(tokens[1].span.end - tokens[1].span.start, 2);
    }

    #[test]
    fn bom_stripping() {
        let tokens = tokenize("\u{FEFF}MsgBox");
        assert_eq!(tokens[0].text, "MsgBox");
        assert_eq!(tokens[0].span.start, 3);
    }

    #[test]
    fn tokenize_line_stops_at_newline() {
        let input = "a )\" b c\nd";
        let tokens = tokenize_line(input, 4, 0, 4);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "b");
        assert_eq!(tokens[0].span.col, 5);
        assert!(!tokens[0].sol);
    }
}
