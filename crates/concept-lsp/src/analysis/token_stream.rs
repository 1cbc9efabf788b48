//! Token stream builder.
//!
//! Tokenizer failures never abort analysis: the error is captured with its
//! editor position and the tokens read before it are kept.

use concept_dsl::{tokenize, Lexer, Token, TokenKind};

use super::result::AnalysisError;
use super::text_document::TextDocument;

/// Tokens for the grammar parser plus captured tokenizer errors.
#[derive(Clone, Debug, Default)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    /// Offset where the stream ends: the tokenizer error or the end of text
    pub end: usize,
    pub errors: Vec<AnalysisError>,
}

impl TokenStream {
    /// Offset of the captured tokenizer error, if any.
    pub fn error_offset(&self) -> Option<usize> {
        (!self.errors.is_empty()).then_some(self.end)
    }
}

pub fn build_token_stream(document: &TextDocument) -> TokenStream {
    match tokenize(document.text()) {
        Ok(tokens) => TokenStream {
            tokens,
            end: document.len(),
            errors: Vec::new(),
        },
        Err(e) => {
            tracing::debug!("Tokenizer stopped at offset {}: {}", e.error.position, e.error.message);
            TokenStream {
                end: e.error.position,
                errors: vec![AnalysisError::error(
                    document.line_col_of(e.error.position),
                    e.error.message,
                )],
                tokens: e.tokens,
            }
        }
    }
}

/// Best-effort comment scan. Stops silently at the first lexer error, which
/// the primary pass has already reported.
pub fn scan_comments(text: &str) -> Vec<Token> {
    Lexer::new(text)
        .map_while(Result::ok)
        .filter(|token| token.kind == TokenKind::Comment)
        .collect()
}
