//! Concept catalog: the set of known concept types and the metadata queries
//! the editor services need.

mod loader;

use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::concept::{ConceptType, MemberDef};

/// Embedded default catalog.
const BUILTIN_CATALOG: &str = include_str!("../../config/concepts.yaml");

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid concept catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate concept type '{0}'")]
    DuplicateType(String),

    #[error("concept type '{concept}' lists unknown parent type '{parent}'")]
    UnknownParent { concept: String, parent: String },

    #[error("concept type '{concept}' has invalid keyword '{keyword}'")]
    InvalidKeyword { concept: String, keyword: String },

    #[error("concept type '{concept}' declares member '{member}' twice")]
    DuplicateMember { concept: String, member: String },
}

/// A rendered signature for one concept type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptSignature {
    pub concept_type: String,
    pub signature: String,
    pub documentation: String,
    pub parameters: Vec<MemberDef>,
}

/// Metadata queries over the known concept types.
pub trait ConceptMetadata {
    /// Parsable parameters of a concept type, in order. Empty for unknown types.
    fn parameters_of(&self, concept_type: &str) -> &[MemberDef];

    /// Types that may be nested in `parent`, or every known type at the root.
    fn valid_child_types(&self, parent: Option<&str>) -> Vec<Arc<ConceptType>>;

    fn keyword_of(&self, concept_type: &str) -> Option<&str>;

    /// Combined documentation of every type introduced by `keyword`.
    /// Empty when the keyword is unknown.
    fn description_of(&self, keyword: &str) -> String;

    fn signatures_of(&self, keyword: &str) -> Vec<ConceptSignature>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    concepts: Vec<ConceptType>,
}

/// Validated set of concept types.
#[derive(Debug, Clone, Default)]
pub struct ConceptCatalog {
    types: Vec<Arc<ConceptType>>,
}

impl ConceptCatalog {
    /// Build a catalog, checking names, parents, keywords and members.
    pub fn new(types: Vec<ConceptType>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for ty in &types {
            if !names.insert(ty.name.as_str()) {
                return Err(CatalogError::DuplicateType(ty.name.clone()));
            }
        }

        for ty in &types {
            if let Some(parent) = ty.parents.iter().find(|p| !names.contains(p.as_str())) {
                return Err(CatalogError::UnknownParent {
                    concept: ty.name.clone(),
                    parent: parent.clone(),
                });
            }

            if let Some(keyword) = &ty.keyword {
                let valid = !keyword.is_empty()
                    && keyword.chars().all(|c| c.is_alphanumeric() || c == '_');
                if !valid {
                    return Err(CatalogError::InvalidKeyword {
                        concept: ty.name.clone(),
                        keyword: keyword.clone(),
                    });
                }
            }

            let mut members = HashSet::new();
            for member in &ty.members {
                if !members.insert(member.name.as_str()) {
                    return Err(CatalogError::DuplicateMember {
                        concept: ty.name.clone(),
                        member: member.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            types: types.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a catalog from a YAML document with a top-level `concepts` list.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::new(file.concepts)
    }

    /// The catalog embedded in the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    pub fn types(&self) -> &[Arc<ConceptType>] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ConceptType>> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// Types introduced by `keyword`, in catalog order.
    pub fn types_for_keyword<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a Arc<ConceptType>> + 'a {
        self.types.iter().filter(move |ty| ty.matches_keyword(keyword))
    }
}

impl ConceptMetadata for ConceptCatalog {
    fn parameters_of(&self, concept_type: &str) -> &[MemberDef] {
        self.get(concept_type)
            .map(|ty| ty.members.as_slice())
            .unwrap_or(&[])
    }

    fn valid_child_types(&self, parent: Option<&str>) -> Vec<Arc<ConceptType>> {
        match parent {
            None => self.types.clone(),
            Some(parent) => self
                .types
                .iter()
                .filter(|ty| ty.allowed_in(parent))
                .cloned()
                .collect(),
        }
    }

    fn keyword_of(&self, concept_type: &str) -> Option<&str> {
        self.get(concept_type)?.keyword.as_deref()
    }

    fn description_of(&self, keyword: &str) -> String {
        self.types_for_keyword(keyword)
            .map(|ty| {
                if ty.description.is_empty() {
                    format!("```\n{}\n```", ty.signature())
                } else {
                    format!("```\n{}\n```\n{}", ty.signature(), ty.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn signatures_of(&self, keyword: &str) -> Vec<ConceptSignature> {
        self.types_for_keyword(keyword)
            .map(|ty| ConceptSignature {
                concept_type: ty.name.clone(),
                signature: ty.signature(),
                documentation: ty.description.clone(),
                parameters: ty.members.clone(),
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
