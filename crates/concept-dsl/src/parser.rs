//! Grammar parser for concept scripts.
//!
//! The parser walks the token stream concept by concept and reports its
//! progress to a [`ParseObserver`]:
//!
//! ```text
//! on_keyword(Some(kw))      before each concept, with the peeked keyword
//! on_member_read(..)        after every member read attempt (ok or error)
//! on_context_change(..)     after every `{` push and `}` pop
//! on_keyword(None)          after each concept's terminator
//! ```
//!
//! Parsing stops at the first syntax error. Several concept types may share a
//! keyword; each applicable type is tried on its own copy of the reader and
//! the interpretation that consumed the most tokens wins.

use std::sync::Arc;

use crate::catalog::ConceptCatalog;
use crate::concept::{ConceptInstance, ConceptType, MemberDef, MemberKind};
use crate::error::DslSyntaxError;
use crate::token::Token;
use crate::tokenizer::tokenize;

/// Result of a single member read, as reported to the observer.
pub type MemberValue<'v> = Result<&'v str, &'v DslSyntaxError>;

/// Callbacks fired while a script is parsed. All methods default to no-ops.
pub trait ParseObserver {
    /// A concept is about to be parsed (`Some`) or one has just been
    /// terminated (`None`).
    fn on_keyword(&mut self, _reader: &TokenReader<'_>, _keyword: Option<&str>) {}

    /// A member of `concept` was read; `concept.values` holds the members
    /// read so far.
    fn on_member_read(
        &mut self,
        _reader: &TokenReader<'_>,
        _concept: &ConceptInstance,
        _member: &MemberDef,
        _value: MemberValue<'_>,
    ) {
    }

    /// The context stack changed; `context` is outermost first.
    fn on_context_change(
        &mut self,
        _reader: &TokenReader<'_>,
        _context: &[ConceptInstance],
        _is_opening: bool,
    ) {
    }
}

impl ParseObserver for () {}

// ============================================================================
// Token Reader
// ============================================================================

/// Cursor over a token slice. Cheap to copy for speculative parsing.
#[derive(Clone, Copy, Debug)]
pub struct TokenReader<'a> {
    tokens: &'a [Token],
    position: usize,
    end: usize,
}

impl<'a> TokenReader<'a> {
    /// `end` is the script offset reported for errors at the end of input.
    pub fn new(tokens: &'a [Token], end: usize) -> Self {
        Self {
            tokens,
            position: 0,
            end,
        }
    }

    /// Index of the next unread token.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// The most recently consumed token.
    pub fn last_read(&self) -> Option<&'a Token> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
    }

    /// The next token's value if it can be read as text.
    pub fn peek_text(&self) -> Option<&'a str> {
        self.peek()
            .filter(|token| token.is_text())
            .map(|token| token.value.as_str())
    }

    /// Script offset of the next token, or the end offset.
    pub fn error_position(&self) -> usize {
        self.peek().map(|token| token.start).unwrap_or(self.end)
    }

    pub fn read_text(&mut self) -> Result<&'a str, DslSyntaxError> {
        match self.peek() {
            Some(token) if token.is_text() => {
                self.position += 1;
                Ok(token.value.as_str())
            }
            Some(token) => Err(DslSyntaxError::new(
                token.start,
                format!("Expected a text value, found \"{}\".", token.value),
            )),
            None => Err(DslSyntaxError::new(
                self.end,
                "Unexpected end of script, expected a text value.",
            )),
        }
    }

    /// Read `text ( '.' text )*`.
    pub fn read_reference(&mut self) -> Result<String, DslSyntaxError> {
        let mut path = self.read_text()?.to_string();
        while self.try_read(".") {
            path.push('.');
            path.push_str(self.read_text()?);
        }
        Ok(path)
    }

    /// Consume the next token if it is the given special token.
    pub fn try_read(&mut self, special: &str) -> bool {
        if self.peek().is_some_and(|token| token.is_special(special)) {
            self.position += 1;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

enum AttemptError {
    /// The type is not allowed in the current context
    NotApplicable,
    Syntax(DslSyntaxError),
}

/// Parser over the concept types of a catalog.
pub struct DslParser<'c> {
    catalog: &'c ConceptCatalog,
}

impl<'c> DslParser<'c> {
    pub fn new(catalog: &'c ConceptCatalog) -> Self {
        Self { catalog }
    }

    /// Tokenize and parse a whole script without observing it.
    pub fn parse_script(&self, source: &str) -> Result<Vec<ConceptInstance>, DslSyntaxError> {
        let tokens = tokenize(source).map_err(|e| e.error)?;
        self.parse(&tokens, source.len(), &mut ())
    }

    /// Parse a token stream, reporting progress to `observer`.
    pub fn parse(
        &self,
        tokens: &[Token],
        end: usize,
        observer: &mut dyn ParseObserver,
    ) -> Result<Vec<ConceptInstance>, DslSyntaxError> {
        let mut reader = TokenReader::new(tokens, end);
        let mut context: Vec<ConceptInstance> = Vec::new();
        let mut parsed = Vec::new();

        while !reader.at_end() {
            let concept = self.parse_next_concept(&mut reader, &context, observer)?;
            parsed.push(concept.clone());
            self.update_context(&mut reader, &mut context, concept, observer)?;
        }

        if let Some(open) = context.last() {
            return Err(DslSyntaxError::new(
                end,
                format!("Expected \"}}\" at the end of the script to close concept \"{open}\"."),
            ));
        }

        tracing::trace!(concepts = parsed.len(), "Parsed concept script");
        Ok(parsed)
    }

    fn parse_next_concept(
        &self,
        reader: &mut TokenReader<'_>,
        context: &[ConceptInstance],
        observer: &mut dyn ParseObserver,
    ) -> Result<ConceptInstance, DslSyntaxError> {
        let keyword = reader.peek_text();
        observer.on_keyword(reader, keyword);

        let Some(keyword) = keyword else {
            let message = match reader.peek() {
                Some(token) => format!("Unexpected \"{}\", expected a concept keyword.", token.value),
                None => "Unexpected end of script, expected a concept keyword.".to_string(),
            };
            return Err(DslSyntaxError::new(reader.error_position(), message));
        };

        let mut interpretations = Vec::new();
        let mut errors: Vec<DslSyntaxError> = Vec::new();
        let mut known_keyword = false;

        for concept_type in self.catalog.types_for_keyword(keyword) {
            known_keyword = true;
            let mut attempt = *reader;
            match self.parse_concept(concept_type, &mut attempt, context, observer) {
                Ok(instance) => interpretations.push((instance, attempt)),
                Err(AttemptError::NotApplicable) => {}
                Err(AttemptError::Syntax(error)) => errors.push(error),
            }
        }

        if interpretations.is_empty() {
            let keyword_position = reader.error_position();
            return Err(if !known_keyword {
                DslSyntaxError::new(
                    keyword_position,
                    format!("Unrecognized concept keyword \"{keyword}\"."),
                )
            } else if let Some(furthest) = errors.into_iter().max_by_key(|e| e.position) {
                furthest
            } else {
                let parent = context
                    .last()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                DslSyntaxError::new(
                    keyword_position,
                    format!("Concept \"{keyword}\" is not allowed inside \"{parent}\"."),
                )
            });
        }

        let longest = interpretations
            .iter()
            .map(|(_, next)| next.position())
            .max()
            .unwrap_or_default();
        interpretations.retain(|(_, next)| next.position() == longest);

        if interpretations.len() > 1 {
            let names: Vec<_> = interpretations
                .iter()
                .map(|(instance, _)| instance.type_name().to_string())
                .collect();
            return Err(DslSyntaxError::new(
                reader.error_position(),
                format!(
                    "Ambiguous syntax for \"{keyword}\", it matches: {}.",
                    names.join(", ")
                ),
            ));
        }

        match interpretations.pop() {
            Some((instance, next)) => {
                *reader = next;
                Ok(instance)
            }
            None => Err(DslSyntaxError::new(
                reader.error_position(),
                format!("Unrecognized concept keyword \"{keyword}\"."),
            )),
        }
    }

    fn parse_concept(
        &self,
        concept_type: &Arc<ConceptType>,
        reader: &mut TokenReader<'_>,
        context: &[ConceptInstance],
        observer: &mut dyn ParseObserver,
    ) -> Result<ConceptInstance, AttemptError> {
        if let Some(parent) = context.last() {
            if !concept_type.allowed_in(parent.type_name()) {
                return Err(AttemptError::NotApplicable);
            }
        }

        reader.read_text().map_err(AttemptError::Syntax)?;
        let mut instance = ConceptInstance::new(Arc::clone(concept_type));

        for member in &concept_type.members {
            let value = match member.kind {
                MemberKind::Text => reader.read_text().map(str::to_string),
                MemberKind::Reference => reader.read_reference(),
            };

            match value {
                Ok(value) => {
                    instance.values.push(value);
                    let value = instance.values.last().map(String::as_str).unwrap_or_default();
                    observer.on_member_read(reader, &instance, member, Ok(value));
                }
                Err(error) => {
                    let error = DslSyntaxError::new(
                        error.position,
                        format!(
                            "Cannot read {} of \"{}\". {}",
                            member.label(),
                            instance,
                            error.message
                        ),
                    );
                    observer.on_member_read(reader, &instance, member, Err(&error));
                    return Err(AttemptError::Syntax(error));
                }
            }
        }

        Ok(instance)
    }

    fn update_context(
        &self,
        reader: &mut TokenReader<'_>,
        context: &mut Vec<ConceptInstance>,
        concept: ConceptInstance,
        observer: &mut dyn ParseObserver,
    ) -> Result<(), DslSyntaxError> {
        if reader.try_read("{") {
            context.push(concept);
            observer.on_context_change(reader, context, true);
        } else if !reader.try_read(";") {
            return Err(DslSyntaxError::new(
                reader.error_position(),
                format!("Expected \";\" or \"{{\" after \"{concept}\"."),
            ));
        }
        // Gap between constructs starts at the terminator, before any "}".
        observer.on_keyword(reader, None);

        while reader.peek().is_some_and(|token| token.is_special("}")) {
            if context.is_empty() {
                return Err(DslSyntaxError::new(
                    reader.error_position(),
                    "Unexpected \"}\", there is no open concept to close.",
                ));
            }
            reader.try_read("}");
            context.pop();
            observer.on_context_change(reader, context, false);
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
