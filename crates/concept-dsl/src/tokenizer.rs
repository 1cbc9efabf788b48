//! Nom-based lexer for concept scripts.
//!
//! [`Lexer`] yields every token including comments and stops after the first
//! syntax error. [`tokenize`] is the parser-facing entry point: it drops
//! comments and keeps the tokens read before an error.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::one_of,
    combinator::map,
    error::{Error as NomError, ErrorKind},
    sequence::preceded,
    IResult,
};

use crate::error::{DslSyntaxError, TokenizeError};
use crate::token::{Token, TokenKind};

/// Characters that form single-character special tokens.
pub const SPECIAL_CHARS: &str = "{};.";

/// Tokenize a script for the grammar parser. Comments are skipped.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    for token in Lexer::new(source) {
        match token {
            Ok(token) if token.kind == TokenKind::Comment => {}
            Ok(token) => tokens.push(token),
            Err(error) => return Err(TokenizeError { error, tokens }),
        }
    }
    Ok(tokens)
}

/// Raw token iterator over a script, comments included.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            failed: false,
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.source[self.pos..];
        if let Ok((remaining, _)) = whitespace(rest) {
            self.pos += rest.len() - remaining.len();
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, DslSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();

        let start = self.pos;
        let input = &self.source[start..];
        let first = input.chars().next()?;

        match raw_token(input) {
            Ok((rest, (kind, value))) => {
                self.pos = self.source.len() - rest.len();
                Some(Ok(Token::new(kind, value, start, self.pos)))
            }
            Err(nom::Err::Failure(_)) => {
                self.failed = true;
                Some(Err(DslSyntaxError::new(
                    start,
                    format!("Missing closing character ({first}) for string literal."),
                )))
            }
            Err(_) => {
                self.failed = true;
                Some(Err(DslSyntaxError::new(
                    start,
                    format!("Unexpected character '{first}'."),
                )))
            }
        }
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

fn raw_token(input: &str) -> IResult<&str, (TokenKind, String)> {
    alt((
        map(comment, |text| (TokenKind::Comment, text.to_string())),
        map(string_literal, |text| (TokenKind::StringLiteral, text)),
        map(special, |c| (TokenKind::Special, c.to_string())),
        map(identifier, |text| (TokenKind::Identifier, text.to_string())),
    ))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    preceded(tag("//"), take_till(|c| c == '\n' || c == '\r'))(input)
}

fn special(input: &str) -> IResult<&str, char> {
    one_of(SPECIAL_CHARS)(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Quoted text; the quote character is escaped by doubling it.
///
/// A missing closing quote is a `Failure` so `alt` does not fall through to
/// the other token kinds.
fn string_literal(input: &str) -> IResult<&str, String> {
    let (mut rest, quote) = one_of("\"'")(input)?;
    let mut value = String::new();
    loop {
        let Some(idx) = rest.find(quote) else {
            return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char)));
        };
        value.push_str(&rest[..idx]);
        rest = &rest[idx + quote.len_utf8()..];
        match rest.strip_prefix(quote) {
            Some(after_escape) => {
                value.push(quote);
                rest = after_escape;
            }
            None => return Ok((rest, value)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
