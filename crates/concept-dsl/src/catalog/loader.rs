//! Catalog loader
//!
//! Loads concept catalogs from a single YAML file or from a directory of
//! YAML files whose `concepts` lists are merged in file name order.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{CatalogFile, ConceptCatalog};
use crate::concept::ConceptType;

impl ConceptCatalog {
    /// Load a catalog from a `.yaml` file or a directory of them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let files = if path.is_dir() {
            yaml_files_in(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let mut concepts: Vec<ConceptType> = Vec::new();
        for file in &files {
            concepts.extend(read_catalog_file(file)?);
        }

        let catalog = ConceptCatalog::new(concepts)
            .with_context(|| format!("Invalid concept catalog at {}", path.display()))?;

        info!(
            "Loaded {} concept types from {} file(s) at {}",
            catalog.len(),
            files.len(),
            path.display()
        );
        Ok(catalog)
    }
}

fn yaml_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read catalog directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_catalog_file(path: &Path) -> Result<Vec<ConceptType>> {
    debug!("Reading concept catalog {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: CatalogFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(file.concepts)
}
