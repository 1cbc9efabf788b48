//! Frozen output of one analysis run.

use std::collections::HashMap;

use concept_dsl::{ConceptInstance, MemberDef, Token};

use super::text_document::{LineCol, TextDocument};

/// Error severity as published to the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// A positioned error found while analysing a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisError {
    pub line_col: LineCol,
    pub message: String,
    pub severity: ErrorSeverity,
}

impl AnalysisError {
    pub fn error(line_col: LineCol, message: impl Into<String>) -> Self {
        Self {
            line_col,
            message: message.into(),
            severity: ErrorSeverity::Error,
        }
    }
}

/// Parse state observed at a cursor (or at the start of the document for a
/// whole-document run).
#[derive(Clone, Debug, Default)]
pub struct AnalysisResult {
    /// The analysed text, truncated after the cursor line for cursor runs
    pub text_document: TextDocument,
    pub line_col: LineCol,
    pub offset: usize,
    pub tokens: Vec<Token>,
    pub comment_tokens: Vec<Token>,
    pub tokenizer_errors: Vec<AnalysisError>,
    pub parser_errors: Vec<AnalysisError>,
    /// Keyword of the concept the cursor is in
    pub keyword_token: Option<Token>,
    /// First keyword boundary after the cursor
    pub next_keyword_token: Option<Token>,
    /// Enclosing concepts at the cursor, outermost first
    pub concept_context: Vec<ConceptInstance>,
    /// Concepts the cursor may be completing, one per type
    pub valid_concepts: Vec<ConceptInstance>,
    /// Per concept type name
    pub last_token_parsed: HashMap<String, Token>,
    /// Per concept type name
    pub last_member_read: HashMap<String, MemberDef>,
    pub is_inside_comment: bool,
    pub successful_run: bool,
}

impl AnalysisResult {
    /// Unsuccessful result at (0, 0), used before the catalog is available.
    pub fn empty(text_document: TextDocument) -> Self {
        Self {
            text_document,
            ..Default::default()
        }
    }

    /// Tokenizer errors followed by parser errors.
    pub fn all_errors(&self) -> impl Iterator<Item = &AnalysisError> + '_ {
        self.tokenizer_errors.iter().chain(self.parser_errors.iter())
    }

    /// Token whose span contains the position.
    pub fn token_at(&self, position: LineCol) -> Option<&Token> {
        let offset = self.text_document.offset_of(position);
        self.tokens
            .iter()
            .find(|token| token.start <= offset && offset < token.end)
    }

    /// Last token whose span contains or ends right at the position.
    pub fn token_being_typed_at(&self, position: LineCol) -> Option<&Token> {
        let offset = self.text_document.offset_of(position);
        self.tokens.iter().rev().find(|token| token.touches(offset))
    }

    /// Whether any error is reported on this line or an earlier one.
    pub fn is_after_any_error_line(&self, position: LineCol) -> bool {
        self.all_errors()
            .any(|error| error.line_col.line <= position.line)
    }

    /// Each valid concept with the index of the next member to be typed.
    pub fn valid_concepts_with_active_parameter(&self) -> Vec<(&ConceptInstance, usize)> {
        self.valid_concepts
            .iter()
            .map(|concept| {
                let active = self
                    .last_member_read
                    .get(concept.type_name())
                    .and_then(|member| concept.concept_type.member_index(&member.name))
                    .map_or(0, |index| index + 1);
                (concept, active)
            })
            .collect()
    }
}
