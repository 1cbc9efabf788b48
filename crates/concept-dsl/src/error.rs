//! Syntax errors raised by the lexer and the parser.

use thiserror::Error;

use crate::token::Token;

/// A positioned syntax error. `position` is a byte offset into the script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {position})")]
pub struct DslSyntaxError {
    pub position: usize,
    pub message: String,
}

impl DslSyntaxError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Tokenizing stopped at a syntax error.
///
/// The tokens read before the error are kept so callers can still parse the
/// valid prefix of the script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct TokenizeError {
    #[source]
    pub error: DslSyntaxError,
    pub tokens: Vec<Token>,
}
