//! Concept type metadata and parsed concept instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a member value is read from the token stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// A single identifier or string literal
    #[default]
    Text,
    /// A dotted path of text tokens, e.g. `Shop.Book`
    Reference,
}

/// A parsable parameter of a concept type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    #[serde(default)]
    pub kind: MemberKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl MemberDef {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Text,
            description: None,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Reference,
            description: None,
        }
    }

    /// Parameter label as shown in signatures, e.g. `<Name>` or `<Target.>`.
    pub fn label(&self) -> String {
        match self.kind {
            MemberKind::Text => format!("<{}>", self.name),
            MemberKind::Reference => format!("<{}.>", self.name),
        }
    }
}

/// A concept type: one grammar production of the DSL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptType {
    /// Unique type name, e.g. `EntityInfo`
    pub name: String,
    /// Keyword introducing the concept; keyword-less types are never parsed
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Types this concept may be nested in. Any type is allowed at the root.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

impl ConceptType {
    /// Whether `keyword` introduces this type (case-insensitive).
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.keyword
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(keyword))
    }

    /// Whether the type may be nested directly inside `parent`.
    pub fn allowed_in(&self, parent: &str) -> bool {
        self.parents.iter().any(|p| p == parent)
    }

    /// Render the signature, e.g. `Reference <Name> <Target.>`.
    pub fn signature(&self) -> String {
        let mut parts = vec![self.keyword.clone().unwrap_or_else(|| self.name.clone())];
        parts.extend(self.members.iter().map(MemberDef::label));
        parts.join(" ")
    }

    pub fn member_index(&self, member: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == member)
    }
}

/// A parsed (possibly partial) concept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConceptInstance {
    pub concept_type: Arc<ConceptType>,
    /// Member values in declaration order; shorter than the member list while
    /// parsing is in progress
    pub values: Vec<String>,
}

impl ConceptInstance {
    pub fn new(concept_type: Arc<ConceptType>) -> Self {
        Self {
            concept_type,
            values: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.concept_type.name
    }

    pub fn is_same_type(&self, other: &ConceptInstance) -> bool {
        self.concept_type.name == other.concept_type.name
    }
}

impl fmt::Display for ConceptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self
            .concept_type
            .keyword
            .as_deref()
            .unwrap_or(&self.concept_type.name);
        f.write_str(keyword)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}
