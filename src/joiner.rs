//! Line-joiner preprocessing.
//!
//! Runs between the lexer and the parser. Removes comments from the token
//! stream, recognises continuation sections and computes the logical
//! start-of-line mark of every remaining token. The marks live in a
//! separate array aligned with the tokens, so tokens themselves are never
//! rewritten.

use crate::lexer;
use crate::parser::unescape;
use crate::token::{Token, TokenKind};

/// A parenthesized continuation section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joiner {
    /// A `Join` option was given.
    pub join: bool,
    /// Separator placed between section lines.
    pub sep: String,
    pub trim_left: bool,
    pub trim_right: bool,
    /// Semicolon comments inside the section are comments, not text.
    pub trim_comment: bool,
    pub literal_percent: bool,
    pub literal_comma: bool,
    pub literal_accent: bool,
    /// The opening `(`.
    pub start_token: Token,
    /// The closing `)`.
    pub end_token: Token,
    /// Raw contents when the section continues a quoted string.
    pub literal: Option<String>,
}

impl Joiner {
    fn new(start_token: Token, end_token: Token, options: &str) -> Self {
        let mut joiner = Self {
            join: false,
            sep: "\n".to_string(),
            trim_left: false,
            trim_right: true,
            trim_comment: false,
            literal_percent: false,
            literal_comma: false,
            literal_accent: false,
            start_token,
            end_token,
            literal: None,
        };

        for option in options.split_whitespace() {
            let lower = option.to_ascii_lowercase();
            match lower.as_str() {
                "ltrim" => joiner.trim_left = true,
                "ltrim0" => joiner.trim_left = false,
                "rtrim0" => joiner.trim_right = false,
                "c" | "com" | "comment" | "comments" => joiner.trim_comment = true,
                "%" => joiner.literal_percent = true,
                "," => joiner.literal_comma = true,
                "`" => joiner.literal_accent = true,
                _ if lower.starts_with("join") => {
                    joiner.join = true;
                    joiner.sep = unescape(&option[4..].replace("`s", " "));
                }
                _ => tracing::debug!(option, "ignoring unknown continuation option"),
            }
        }

        joiner
    }

    /// Apply the comment and trim options to one section line.
    #[must_use]
    pub fn trim_line<'s>(&self, line: &'s str) -> &'s str {
        let mut line = line;
        if self.trim_comment {
            line = strip_comment(line);
        }
        if self.trim_left {
            line = line.trim_start_matches([' ', '\t']);
        }
        if self.trim_right {
            line = line.trim_end_matches([' ', '\t']);
        }
        line
    }

    /// Join section lines with the separator.
    #[must_use]
    pub fn join_lines<'s>(&self, lines: impl IntoIterator<Item = &'s str>) -> String {
        lines
            .into_iter()
            .map(|line| self.trim_line(line))
            .collect::<Vec<_>>()
            .join(&self.sep)
    }
}

pub(crate) fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with(';') {
        return "";
    }
    line.find(" ;")
        .into_iter()
        .chain(line.find("\t;"))
        .min()
        .map_or(line, |at| &line[..at])
}

/// Split on `\r\n`, `\n` and `\r`.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&text[start..]);
    lines
}

/// Logical-line annotation of one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineMark {
    /// No earlier token shares this token's logical line.
    pub sol: bool,
    /// Index of the enclosing continuation section.
    pub joiner: Option<usize>,
}

/// Comment-free token stream with its logical-line annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    /// Index-aligned with `tokens`.
    pub marks: Vec<LineMark>,
    pub joiners: Vec<Joiner>,
    /// Line and block comments, in source order.
    pub comments: Vec<Token>,
}

/// Strip comments and resolve continuation sections.
#[tracing::instrument(skip_all, fields(token_count = raw.len()))]
#[must_use]
pub fn preprocess(source: &str, raw: Vec<Token>) -> TokenStream {
    Preprocessor {
        source,
        raw,
        out: TokenStream::default(),
        last_line: None,
    }
    .run()
}

struct Preprocessor<'a> {
    source: &'a str,
    raw: Vec<Token>,
    out: TokenStream,
    /// Physical line of the most recently emitted token.
    last_line: Option<usize>,
}

impl Preprocessor<'_> {
    fn run(mut self) -> TokenStream {
        let mut i = 0;
        while i < self.raw.len() {
            let token = &self.raw[i];

            if token.sol && self.opens_block_comment(i) {
                i = self.block_comment(i);
                continue;
            }

            if token.kind == TokenKind::Comment {
                self.out.comments.push(token.clone());
                i += 1;
                continue;
            }

            if token.sol && token.text == "(" {
                if let Some(next) = self.joiner(i) {
                    i = next;
                    continue;
                }
            }

            self.emit(self.raw[i].clone(), None);
            i += 1;
        }

        self.out
    }

    fn emit(&mut self, token: Token, joiner: Option<usize>) {
        let sol = joiner.is_none() && self.last_line != Some(token.span.line);
        self.last_line = Some(token.span.line);
        self.out.marks.push(LineMark { sol, joiner });
        self.out.tokens.push(token);
    }

    fn opens_block_comment(&self, i: usize) -> bool {
        let token = &self.raw[i];
        token.text == "/"
            && self
                .raw
                .get(i + 1)
                .is_some_and(|next| next.text.starts_with('*') && token.touches(next))
    }

    /// Swallow a `/* ... */` comment starting at raw index `i`.
    fn block_comment(&mut self, i: usize) -> usize {
        let open = &self.raw[i];
        let body_start = open.span.start + 2;
        let end = self.source[body_start..]
            .find("*/")
            .map_or(self.source.len(), |at| body_start + at + 2);

        self.out.comments.push(Token {
            kind: TokenKind::Comment,
            text: self.source[open.span.start..end].to_string(),
            span: open.span.to(end),
            sol: true,
        });

        let mut next = i;
        while next < self.raw.len() && self.raw[next].span.start < end {
            next += 1;
        }

        // A token straddling the terminator hides the rest of its line.
        let straddler = &self.raw[next - 1];
        if straddler.span.end > end {
            let line = straddler.span.line;
            let col = col_at(self.source, end);
            while next < self.raw.len() && self.raw[next].span.line == line {
                next += 1;
            }
            for token in lexer::tokenize_line(self.source, end, line, col) {
                self.emit(token, None);
            }
        }

        next
    }

    /// Try to read a continuation section opened at raw index `i`.
    ///
    /// Returns the raw index to resume at, or `None` when the line is not a
    /// section opener.
    fn joiner(&mut self, i: usize) -> Option<usize> {
        let open = &self.raw[i];
        let line = open.span.line;

        let mut body = i + 1;
        let mut options_end = open.span.end;
        while body < self.raw.len() && self.raw[body].span.line == line {
            let token = &self.raw[body];
            if token.kind != TokenKind::Comment {
                if token.text == ")" {
                    return None;
                }
                options_end = token.span.end;
            }
            body += 1;
        }

        let close = (body..self.raw.len()).find(|&j| self.raw[j].sol && self.raw[j].text == ")")?;

        let index = self.out.joiners.len();
        let options = &self.source[open.span.end..options_end];
        let mut joiner = Joiner::new(open.clone(), self.raw[close].clone(), options);
        tracing::debug!(line, options, "continuation section");

        if let Some(next) = self.string_continuation(&mut joiner, index, body, close) {
            self.out.joiners.push(joiner);
            return Some(next);
        }

        let trim_comment = joiner.trim_comment;
        self.out.joiners.push(joiner);

        for j in body..close {
            let token = self.raw[j].clone();
            if token.kind == TokenKind::Comment && trim_comment {
                self.out.comments.push(token);
            } else {
                self.emit(token, Some(index));
            }
        }

        self.last_line = Some(self.raw[close].span.line);
        Some(close + 1)
    }

    /// Merge an unterminated string on the line above a section with the
    /// section and the rest of the string on the closing line.
    fn string_continuation(
        &mut self,
        joiner: &mut Joiner,
        index: usize,
        body: usize,
        close: usize,
    ) -> Option<usize> {
        let last = self.out.tokens.last()?;
        let line = last.span.line;
        let mut quote = None;
        for (at, token) in self.out.tokens.iter().enumerate().rev() {
            if token.span.line != line || self.out.marks[at].joiner.is_some() {
                break;
            }
            if token.kind == TokenKind::Symbol && token.text == "\"" {
                quote = Some(at);
            }
        }
        let quote = quote?;
        let source = self.source;

        let close_token = &self.raw[close];
        let closing_quote = string_end(&source[close_token.span.end..])?;
        let string_end = close_token.span.end + closing_quote + 1;

        let open_quote = self.out.tokens[quote].clone();
        let mark = self.out.marks[quote];

        let prefix = &source[open_quote.span.end..line_end(source, open_quote.span.end)];
        let body_start = next_line_start(source, line_end(source, joiner.start_token.span.end));
        let body_end = line_start(source, close_token.span.start);
        let lines = if body_start >= body_end {
            Vec::new()
        } else {
            let body = &source[body_start..body_end];
            let body = body
                .strip_suffix("\r\n")
                .or_else(|| body.strip_suffix(['\n', '\r']))
                .unwrap_or(body);
            split_lines(body)
        };
        let suffix = &source[close_token.span.end..string_end - 1];

        joiner.literal = Some(format!("{prefix}{}{suffix}", joiner.join_lines(lines)));

        for token in &self.raw[body..close] {
            if token.kind == TokenKind::Comment && joiner.trim_comment {
                self.out.comments.push(token.clone());
            }
        }

        self.out.tokens.truncate(quote);
        self.out.marks.truncate(quote);
        self.out.tokens.push(Token {
            kind: TokenKind::String,
            text: self.source[open_quote.span.start..string_end].to_string(),
            span: open_quote.span.to(string_end),
            sol: open_quote.sol,
        });
        self.out.marks.push(LineMark {
            sol: mark.sol,
            joiner: Some(index),
        });

        let close_line = close_token.span.line;
        self.last_line = Some(close_line);
        let mut next = close + 1;
        while next < self.raw.len() && self.raw[next].span.line == close_line {
            next += 1;
        }
        let col = col_at(source, string_end);
        for token in lexer::tokenize_line(source, string_end, close_line, col) {
            if token.kind == TokenKind::Comment {
                self.out.comments.push(token);
            } else {
                self.emit(token, None);
            }
        }

        Some(next)
    }
}

/// Offset of the quote closing a string whose opening quote lies before
/// `text`, if it is closed before the end of the line.
fn string_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' if bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return Some(i),
            b'\r' | b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind(['\r', '\n']).map_or(0, |at| at + 1)
}

fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find(['\r', '\n'])
        .map_or(source.len(), |at| offset + at)
}

fn next_line_start(source: &str, line_end: usize) -> usize {
    let rest = &source[line_end..];
    if rest.starts_with("\r\n") {
        line_end + 2
    } else if rest.starts_with(['\r', '\n']) {
        line_end + 1
    } else {
        line_end
    }
}

fn col_at(source: &str, offset: usize) -> usize {
    source[line_start(source, offset)..offset].chars().count()
}
