//! Document analysis for the concept Language Server.
//!
//! Every query reparses a truncated copy of the document and observes the
//! grammar parser at the cursor; results are cached per document.

mod context;
pub mod document;
mod result;
pub mod run;
pub mod text_document;
pub mod token_stream;

pub use context::DslContext;
pub use document::{CacheKey, DslDocument};
pub use result::{AnalysisError, AnalysisResult, ErrorSeverity};
pub use run::{AnalysisRun, CursorObserver};
pub use text_document::{LineCol, TextDocument};
pub use token_stream::{build_token_stream, scan_comments, TokenStream};
