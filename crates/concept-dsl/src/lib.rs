//! concept-dsl: Tokenizer, grammar parser and concept catalog for the concept DSL
//!
//! Scripts are sequences of concepts of the form `Keyword member member;` or
//! `Keyword member { nested concepts }`. This crate contains the pure language
//! logic with no editor or protocol dependencies:
//! - Token types and a comment-aware raw lexer
//! - A grammar parser that reports its progress through [`ParseObserver`]
//! - Concept type metadata and the YAML catalog loader
//!
//! The parser keeps no tree between runs; callers that need positional
//! information observe the callbacks while a run is in progress.

pub mod catalog;
pub mod concept;
pub mod error;
pub mod parser;
pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use catalog::{CatalogError, ConceptCatalog, ConceptMetadata, ConceptSignature};
pub use concept::{ConceptInstance, ConceptType, MemberDef, MemberKind};
pub use error::{DslSyntaxError, TokenizeError};
pub use parser::{DslParser, MemberValue, ParseObserver, TokenReader};
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, Lexer};
