//! Token types produced by the lexer.

use std::fmt;

/// Kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Bare word: keywords, names, numbers
    Identifier,
    /// Quoted text, `"..."` or `'...'`
    StringLiteral,
    /// Structural punctuation: `{`, `}`, `;`, `.`
    Special,
    /// `//` line comment (only produced by the raw [`Lexer`](crate::Lexer))
    Comment,
}

/// A token with its decoded value and source span.
///
/// `start..end` is the byte range in the source, including quotes and the
/// `//` comment marker. `value` is the decoded text without them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            start,
            end,
        }
    }

    /// Length of the token in the source text.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Identifiers and string literals can both be read as text values.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::StringLiteral)
    }

    pub fn is_special(&self, value: &str) -> bool {
        self.kind == TokenKind::Special && self.value == value
    }

    /// True when `offset` lies inside the token or right after its last char.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::StringLiteral => write!(f, "\"{}\"", self.value),
            TokenKind::Comment => write!(f, "//{}", self.value),
            _ => f.write_str(&self.value),
        }
    }
}
