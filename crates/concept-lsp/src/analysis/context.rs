//! Process-wide language context: the concept catalog, set once.

use std::sync::Arc;

use anyhow::{Context, Result};
use concept_dsl::ConceptCatalog;
use once_cell::sync::OnceCell;

use crate::config::ServerConfig;

/// Holds the concept catalog once it has been loaded.
///
/// Readers never block: before initialization every query sees `None`.
#[derive(Debug, Default)]
pub struct DslContext {
    catalog: OnceCell<Arc<ConceptCatalog>>,
}

impl DslContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that is already initialized.
    pub fn with_catalog(catalog: ConceptCatalog) -> Self {
        let context = Self::new();
        context.initialize(catalog);
        context
    }

    /// Set the catalog. Returns false if it was already set.
    pub fn initialize(&self, catalog: ConceptCatalog) -> bool {
        let initialized = self.catalog.set(Arc::new(catalog)).is_ok();
        if !initialized {
            tracing::warn!("DslContext already initialized; ignoring new catalog");
        }
        initialized
    }

    /// Load the configured catalog (or the built-in one) and initialize.
    pub fn initialize_from_config(&self, config: &ServerConfig) -> Result<()> {
        let catalog = match &config.catalog_path {
            Some(path) => ConceptCatalog::load(path)?,
            None => ConceptCatalog::builtin().context("Built-in concept catalog is invalid")?,
        };
        tracing::info!("DslContext initialized with {} concept types", catalog.len());
        self.initialize(catalog);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.catalog.get().is_some()
    }

    pub fn catalog(&self) -> Option<Arc<ConceptCatalog>> {
        self.catalog.get().cloned()
    }
}
