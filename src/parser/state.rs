use crate::joiner::{Joiner, LineMark, TokenStream};
use crate::token::{Span, Token};

use super::expression::Fixity;
use super::{ParseError, ParseResult, expression};

/// Cursor over the preprocessed token stream.
pub(crate) struct ParseState<'a> {
    pub source: &'a str,
    tokens: &'a [Token],
    marks: &'a [LineMark],
    joiners: &'a [Joiner],
    pub pos: usize,
}

impl<'a> ParseState<'a> {
    pub fn new(source: &'a str, stream: &'a TokenStream) -> Self {
        Self {
            source,
            tokens: &stream.tokens,
            marks: &stream.marks,
            joiners: &stream.joiners,
            pos: 0,
        }
    }

    fn index(&self, offset: isize) -> Option<usize> {
        self.pos
            .checked_add_signed(offset)
            .filter(|&i| i < self.tokens.len())
    }

    /// Token at `offset` from the cursor, `None` past either end.
    pub fn token(&self, offset: isize) -> Option<&'a Token> {
        self.index(offset).map(|i| &self.tokens[i])
    }

    pub fn current(&self) -> Option<&'a Token> {
        self.token(0)
    }

    pub fn previous(&self) -> Option<&'a Token> {
        self.token(-1)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// The current token starts a logical line. True at end of input.
    pub fn sol(&self) -> bool {
        self.index(0).is_none_or(|i| self.marks[i].sol)
    }

    /// The current token belongs to the logical line of the previous one.
    pub fn continue_line(&self) -> bool {
        self.continues(0)
    }

    /// Same as [`Self::continue_line`] for the token at `offset`.
    pub fn continues(&self, offset: isize) -> bool {
        self.index(offset).is_some_and(|i| self.continues_at(i))
    }

    /// End of the logical line: end of input, or a token that starts a new
    /// line.
    pub fn eol(&self) -> bool {
        !self.continue_line()
    }

    fn continues_at(&self, index: usize) -> bool {
        let mark = self.marks[index];
        if !mark.sol || mark.joiner.is_some() {
            return true;
        }
        let token = &self.tokens[index];
        is_continuation_operator(token) && !self.line_has_double_colon(index)
    }

    /// No token after `offset` continues its logical line.
    pub fn ends_line(&self, offset: isize) -> bool {
        !self.continues(offset + 1)
    }

    fn line_has_double_colon(&self, index: usize) -> bool {
        let line = self.tokens[index].span.line;
        self.tokens[index..]
            .windows(2)
            .take_while(|pair| pair[0].span.line == line)
            .any(|pair| pair[0].text == ":" && pair[1].text == ":" && pair[0].touches(&pair[1]))
    }

    /// Two adjacent `:` tokens at `offset`.
    pub fn is_double_colon(&self, offset: isize) -> bool {
        match (self.token(offset), self.token(offset + 1)) {
            (Some(a), Some(b)) => a.text == ":" && b.text == ":" && a.touches(b),
            _ => false,
        }
    }

    /// Case-insensitive lookahead over a fixed token sequence.
    pub fn matches(&self, texts: &[&str]) -> bool {
        texts.iter().enumerate().all(|(i, text)| {
            isize::try_from(i)
                .ok()
                .and_then(|offset| self.token(offset))
                .is_some_and(|token| token.is(text))
        })
    }

    /// Continuation section enclosing the token at `offset`.
    pub fn joiner(&self, offset: isize) -> Option<&'a Joiner> {
        self.index(offset)
            .and_then(|i| self.marks[i].joiner)
            .map(|j| &self.joiners[j])
    }

    pub fn mark(&self, index: usize) -> LineMark {
        self.marks[index]
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    pub fn joiner_at(&self, index: usize) -> &'a Joiner {
        &self.joiners[index]
    }

    /// End offset of the last consumed token.
    pub fn prev_end(&self) -> usize {
        self.previous().map_or(0, |token| token.span.end)
    }

    /// `start` stretched to the end of the last consumed token.
    pub fn span_from(&self, start: Span) -> Span {
        start.to(self.prev_end())
    }

    /// Run `parse`, restoring the cursor when it does not match.
    ///
    /// Errors are passed through without rewinding.
    pub fn attempt<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let start = self.pos;
        let result = parse(self)?;
        if result.is_none() {
            self.pos = start;
        }
        Ok(result)
    }

    /// Error at the current token, or past the last one at end of input.
    pub fn error(&self) -> ParseError {
        self.current()
            .map_or_else(|| ParseError::eof(self.tokens.last()), ParseError::at)
    }

    /// Consume a token with the given text or fail.
    pub fn expect(&mut self, text: &str) -> Result<&'a Token, ParseError> {
        match self.current() {
            Some(token) if token.is(text) => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error()),
        }
    }
}

/// Operators that glue a physical line to the one above it.
fn is_continuation_operator(token: &Token) -> bool {
    token.kind == crate::token::TokenKind::Symbol
        && (token.text == "?" || expression::precedence(Fixity::Infix, &token.text).is_some())
}
