//! Document state tracking with a per-document analysis cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::context::DslContext;
use super::result::AnalysisResult;
use super::run::AnalysisRun;
use super::text_document::{LineCol, TextDocument};

/// Serializes parse runs across all documents.
static ANALYSIS_LOCK: Mutex<()> = Mutex::new(());

/// Cache key: a cursor offset, or the whole-document analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Offset(usize),
    WholeDocument,
}

#[derive(Debug, Default)]
struct DocumentState {
    text_document: TextDocument,
    cache: HashMap<CacheKey, Arc<AnalysisResult>>,
}

/// An open document: its current text and the analyses computed for it.
#[derive(Debug)]
pub struct DslDocument {
    context: Arc<DslContext>,
    state: Mutex<DocumentState>,
}

impl DslDocument {
    pub fn new(context: Arc<DslContext>) -> Self {
        Self::with_text(context, "")
    }

    pub fn with_text(context: Arc<DslContext>, text: impl Into<String>) -> Self {
        Self {
            context,
            state: Mutex::new(DocumentState {
                text_document: TextDocument::new(text),
                cache: HashMap::new(),
            }),
        }
    }

    pub fn context(&self) -> &Arc<DslContext> {
        &self.context
    }

    /// Replace the text and drop every cached analysis.
    pub fn update_text(&self, text: impl Into<String>) {
        let mut state = self.lock_state();
        state.text_document = TextDocument::new(text);
        state.cache.clear();
    }

    pub fn text_document(&self) -> TextDocument {
        self.lock_state().text_document.clone()
    }

    /// Borrow the current text without copying it.
    pub fn with_text_document<R>(&self, f: impl FnOnce(&TextDocument) -> R) -> R {
        f(&self.lock_state().text_document)
    }

    pub fn cached_analyses(&self) -> usize {
        self.lock_state().cache.len()
    }

    /// Whole-document analysis.
    pub fn analysis(&self) -> Arc<AnalysisResult> {
        self.analysis_for(None)
    }

    /// Analysis relative to a cursor.
    pub fn analysis_at(&self, position: LineCol) -> Arc<AnalysisResult> {
        self.analysis_for(Some(position))
    }

    fn analysis_for(&self, position: Option<LineCol>) -> Arc<AnalysisResult> {
        let mut state = self.lock_state();
        let key = match position {
            Some(position) => CacheKey::Offset(state.text_document.offset_of(position)),
            None => CacheKey::WholeDocument,
        };

        if let Some(cached) = state.cache.get(&key) {
            return Arc::clone(cached);
        }

        let Some(catalog) = self.context.catalog() else {
            tracing::debug!("Analysis requested before the concept catalog is initialized");
            return Arc::new(AnalysisResult::empty(state.text_document.clone()));
        };

        let result = {
            let _run = ANALYSIS_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::new(AnalysisRun::new(&catalog, &state.text_document).run_for_position(position))
        };
        state.cache.insert(key, Arc::clone(&result));
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
