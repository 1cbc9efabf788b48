//! Cursor-relative parse run.
//!
//! Each run truncates the document after the cursor line, tokenizes it and
//! drives the grammar parser with a [`CursorObserver`]. The observer records
//! what the parser was doing around the cursor; the run then freezes that
//! state into an [`AnalysisResult`]. Nothing is kept between runs.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use concept_dsl::{
    ConceptCatalog, ConceptInstance, DslParser, DslSyntaxError, MemberDef, MemberValue,
    ParseObserver, Token, TokenReader,
};

use super::result::{AnalysisError, AnalysisResult};
use super::text_document::{LineCol, TextDocument};
use super::token_stream::{build_token_stream, scan_comments, TokenStream};

/// One analysis of a document, optionally relative to a cursor.
pub struct AnalysisRun<'a> {
    catalog: &'a ConceptCatalog,
    document: &'a TextDocument,
}

impl<'a> AnalysisRun<'a> {
    pub fn new(catalog: &'a ConceptCatalog, document: &'a TextDocument) -> Self {
        Self { catalog, document }
    }

    /// Analyse the whole document with the cursor at (0, 0).
    pub fn run_for_document(&self) -> AnalysisResult {
        self.run_for_position(None)
    }

    pub fn run_for_position(&self, position: Option<LineCol>) -> AnalysisResult {
        let (text_document, line_col) = match position {
            Some(position) => {
                let offset = self.document.offset_of(position);
                let truncated = self.document.truncated_at_next_line_break(offset);
                (TextDocument::new(truncated), position)
            }
            None => (self.document.clone(), LineCol::ZERO),
        };
        let offset = text_document.offset_of(line_col);
        tracing::trace!("Analysis at {}:\n{}", line_col, text_document.show_position(line_col));

        let stream = build_token_stream(&text_document);
        let comment_tokens = scan_comments(text_document.text());

        let mut observer = CursorObserver::new(&stream.tokens, offset);
        let parser = DslParser::new(self.catalog);
        let outcome = guarded_parse(&parser, &stream, &mut observer);
        let parser_errors = parser_errors(outcome, &stream, &text_document);

        let mut result = AnalysisResult {
            text_document,
            line_col,
            offset,
            tokens: Vec::new(),
            comment_tokens,
            tokenizer_errors: stream.errors.clone(),
            parser_errors,
            ..Default::default()
        };
        observer.apply_to(&mut result);
        result.tokens = stream.tokens;
        apply_comments(&mut result);
        result.successful_run = true;

        tracing::debug!(
            "Analysis at {} done: keyword={:?}, context={}, errors={}",
            line_col,
            result.keyword_token.as_ref().map(|t| t.value.as_str()),
            result.concept_context.len(),
            result.tokenizer_errors.len() + result.parser_errors.len()
        );
        result
    }
}

type ParseOutcome = Result<Result<Vec<ConceptInstance>, DslSyntaxError>, String>;

/// Parse with a panic caught and turned into its message.
fn guarded_parse(
    parser: &DslParser<'_>,
    stream: &TokenStream,
    observer: &mut dyn ParseObserver,
) -> ParseOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| {
        parser.parse(&stream.tokens, stream.end, observer)
    }))
    .map_err(|payload| panic_message(payload.as_ref()))
}

fn parser_errors(
    outcome: ParseOutcome,
    stream: &TokenStream,
    text_document: &TextDocument,
) -> Vec<AnalysisError> {
    match outcome {
        Ok(Ok(_)) => Vec::new(),
        Ok(Err(error)) => {
            // The parser only saw the tokens before a tokenizer error, so
            // anything it reports from there on is a follow-on error.
            if stream.error_offset().is_some_and(|at| error.position >= at) {
                tracing::debug!("Dropping parser error after tokenizer error: {}", error.message);
                Vec::new()
            } else {
                vec![AnalysisError::error(
                    text_document.line_col_of(error.position),
                    error.message,
                )]
            }
        }
        Err(message) => {
            tracing::warn!("Unexpected fault during analysis: {}", message);
            vec![AnalysisError::error(LineCol::ZERO, message)]
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected error during analysis.".to_string()
    }
}

/// Clear the active keyword when the cursor is inside a comment or at the end
/// of a line that ends with one.
fn apply_comments(result: &mut AnalysisResult) {
    let target = result.offset;
    let mut last_before_target: Option<&Token> = None;

    for comment in &result.comment_tokens {
        if comment.start <= target && target < comment.end {
            result.keyword_token = None;
            result.is_inside_comment = true;
            return;
        }
        if comment.start > target {
            break;
        }
        last_before_target = Some(comment);
    }

    if let Some(comment) = last_before_target {
        if result.text_document.line_col_of(comment.start).line == result.line_col.line {
            result.keyword_token = None;
            result.is_inside_comment = true;
        }
    }
}

// ============================================================================
// Cursor Observer
// ============================================================================

/// Run-local builder fed by the parser callbacks.
pub struct CursorObserver<'t> {
    tokens: &'t [Token],
    target: usize,
    last_token_before_target: Option<&'t Token>,
    keyword_token: Option<Token>,
    next_keyword_token: Option<Token>,
    concept_context: Vec<ConceptInstance>,
    valid_concepts: Vec<ConceptInstance>,
    last_token_parsed: HashMap<String, Token>,
    last_member_read: HashMap<String, MemberDef>,
}

impl<'t> CursorObserver<'t> {
    pub fn new(tokens: &'t [Token], target: usize) -> Self {
        Self {
            tokens,
            target,
            last_token_before_target: tokens.iter().rev().find(|t| t.start <= target),
            keyword_token: None,
            next_keyword_token: None,
            concept_context: Vec::new(),
            valid_concepts: Vec::new(),
            last_token_parsed: HashMap::new(),
            last_member_read: HashMap::new(),
        }
    }

    /// Move the observed state into `result`.
    pub fn apply_to(self, result: &mut AnalysisResult) {
        result.keyword_token = self.keyword_token;
        result.next_keyword_token = self.next_keyword_token;
        result.concept_context = self.concept_context;
        result.valid_concepts = self.valid_concepts;
        result.last_token_parsed = self.last_token_parsed;
        result.last_member_read = self.last_member_read;
    }
}

impl ParseObserver for CursorObserver<'_> {
    fn on_keyword(&mut self, reader: &TokenReader<'_>, keyword: Option<&str>) {
        let position = reader.position();
        let index = match keyword {
            None if position > 0 => position - 1,
            _ => position,
        };
        let Some(token) = self.tokens.get(index) else {
            return;
        };

        if token.start <= self.target {
            if keyword.is_some() {
                self.keyword_token = Some(token.clone());
                self.valid_concepts.clear();
            } else {
                self.keyword_token = None;
            }
        } else if self.next_keyword_token.is_none() {
            self.next_keyword_token = Some(token.clone());
        }
    }

    fn on_member_read(
        &mut self,
        reader: &TokenReader<'_>,
        concept: &ConceptInstance,
        member: &MemberDef,
        value: MemberValue<'_>,
    ) {
        let (Some(last_read), Some(before_target)) = (reader.last_read(), self.last_token_before_target)
        else {
            return;
        };

        if last_read.start >= before_target.start
            && !self.valid_concepts.iter().any(|valid| valid.is_same_type(concept))
        {
            self.valid_concepts.push(concept.clone());
        }

        if last_read.start <= before_target.start && value.is_ok() {
            let type_name = concept.type_name().to_string();
            self.last_token_parsed.insert(type_name.clone(), last_read.clone());
            self.last_member_read.insert(type_name, member.clone());
        }
    }

    fn on_context_change(
        &mut self,
        reader: &TokenReader<'_>,
        context: &[ConceptInstance],
        _is_opening: bool,
    ) {
        let Some(last_read) = reader.last_read() else {
            return;
        };
        if last_read.end <= self.target {
            self.concept_context = context.to_vec();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
