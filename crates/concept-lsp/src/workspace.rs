//! Open document registry with change and close timestamps.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tower_lsp::lsp_types::Url;

use crate::analysis::{DslContext, DslDocument};

#[derive(Debug)]
struct OpenDocument {
    document: Arc<DslDocument>,
    updated_at: Instant,
}

#[derive(Debug, Default)]
struct Registry {
    open: HashMap<Url, OpenDocument>,
    closed: HashMap<Url, Instant>,
}

/// Documents known to the server.
#[derive(Debug)]
pub struct Workspace {
    context: Arc<DslContext>,
    registry: RwLock<Registry>,
}

impl Workspace {
    pub fn new(context: Arc<DslContext>) -> Self {
        Self {
            context,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn context(&self) -> &Arc<DslContext> {
        &self.context
    }

    /// Open a document or replace the text of an open one.
    pub fn update_document(&self, uri: Url, text: String) {
        let mut registry = self.write();
        registry.closed.remove(&uri);
        let now = Instant::now();
        if let Some(open) = registry.open.get_mut(&uri) {
            open.document.update_text(text);
            open.updated_at = now;
            return;
        }

        let document = Arc::new(DslDocument::with_text(Arc::clone(&self.context), text));
        registry.open.insert(
            uri,
            OpenDocument {
                document,
                updated_at: now,
            },
        );
    }

    pub fn close_document(&self, uri: &Url) {
        let mut registry = self.write();
        if registry.open.remove(uri).is_some() {
            registry.closed.insert(uri.clone(), Instant::now());
        }
    }

    pub fn document(&self, uri: &Url) -> Option<Arc<DslDocument>> {
        self.read().open.get(uri).map(|open| Arc::clone(&open.document))
    }

    /// Open documents changed after `since` (all of them when `None`).
    pub fn updated_since(&self, since: Option<Instant>) -> Vec<Url> {
        self.read()
            .open
            .iter()
            .filter(|(_, open)| since.map_or(true, |since| open.updated_at > since))
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    /// Documents closed after `since` (all of them when `None`).
    pub fn closed_since(&self, since: Option<Instant>) -> Vec<Url> {
        self.read()
            .closed
            .iter()
            .filter(|(_, closed_at)| since.map_or(true, |since| **closed_at > since))
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    /// Drop close marks at or before `instant`.
    pub fn forget_closed_before(&self, instant: Instant) {
        self.write().closed.retain(|_, closed_at| *closed_at > instant);
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
