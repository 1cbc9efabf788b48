//! Completion handler: keywords valid at the cursor.

use std::collections::BTreeSet;

use concept_dsl::ConceptMetadata;
use tower_lsp::lsp_types::*;

use super::to_line_col;
use crate::analysis::{DslDocument, LineCol};

/// Keywords that can be typed at `position`, sorted and without duplicates.
///
/// Empty inside comments and after a complete keyword (the cursor is then in
/// the member list of a concept).
pub fn completion_keywords(document: &DslDocument, position: LineCol) -> Vec<String> {
    let Some(catalog) = document.context().catalog() else {
        return Vec::new();
    };
    let analysis = document.analysis_at(position);

    if analysis.is_inside_comment {
        return Vec::new();
    }

    let typing = analysis.token_being_typed_at(position);
    if let Some(keyword) = &analysis.keyword_token {
        if typing != Some(keyword) {
            return Vec::new();
        }
    }

    let parent = analysis.concept_context.last().map(|c| c.type_name());
    let keywords: BTreeSet<String> = catalog
        .valid_child_types(parent)
        .iter()
        .filter_map(|ty| catalog.keyword_of(&ty.name).map(str::to_string))
        .collect();

    tracing::debug!(
        "Completion at {}: parent={:?}, {} keywords",
        position,
        parent,
        keywords.len()
    );
    keywords.into_iter().collect()
}

/// Completion items for an LSP position.
pub fn get_completions(document: &DslDocument, position: Position) -> Vec<CompletionItem> {
    let catalog = document.context().catalog();
    completion_keywords(document, to_line_col(document, position))
        .into_iter()
        .map(|keyword| {
            let detail = catalog
                .as_ref()
                .map(|catalog| {
                    catalog
                        .signatures_of(&keyword)
                        .into_iter()
                        .map(|s| s.signature)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .filter(|detail| !detail.is_empty());
            CompletionItem {
                label: keyword,
                kind: Some(CompletionItemKind::KEYWORD),
                detail,
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DslContext;
    use concept_dsl::ConceptCatalog;
    use std::sync::Arc;

    fn document(text: &str) -> DslDocument {
        let context = Arc::new(DslContext::with_catalog(ConceptCatalog::builtin().unwrap()));
        DslDocument::with_text(context, text)
    }

    #[test]
    fn test_root_completion_lists_all_keywords() {
        let keywords = completion_keywords(&document(""), LineCol::ZERO);
        assert!(keywords.contains(&"Module".to_string()));
        assert!(keywords.contains(&"Entity".to_string()));
        assert!(keywords.contains(&"Reference".to_string()));
        let mut sorted = keywords.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keywords, sorted);
    }

    #[test]
    fn test_completion_inside_entity() {
        let keywords = completion_keywords(&document("Entity Book {\n  \n}\n"), LineCol::new(1, 2));
        assert!(keywords.contains(&"ShortString".to_string()));
        assert!(keywords.contains(&"Deactivatable".to_string()));
        assert!(!keywords.contains(&"Entity".to_string()));
        assert!(!keywords.contains(&"Required".to_string()));
    }

    #[test]
    fn test_no_completion_after_complete_keyword() {
        let doc = document("Entity Book { ShortString Title; }\n");
        assert!(completion_keywords(&doc, LineCol::new(0, 27)).is_empty());
    }

    #[test]
    fn test_no_completion_in_comment() {
        let doc = document("// Entity\n");
        assert!(completion_keywords(&doc, LineCol::new(0, 5)).is_empty());
    }

    #[test]
    fn test_completion_items_carry_signatures() {
        let items = get_completions(&document(""), Position::new(0, 0));
        let reference = items.iter().find(|i| i.label == "Reference").unwrap();
        assert_eq!(reference.kind, Some(CompletionItemKind::KEYWORD));
        assert!(reference.detail.as_ref().unwrap().contains("Reference <Name> <Target.>"));
    }

    #[test]
    fn test_uninitialized_context_gives_no_completion() {
        let doc = DslDocument::with_text(Arc::new(DslContext::new()), "");
        assert!(completion_keywords(&doc, LineCol::ZERO).is_empty());
    }

    #[test]
    fn test_keywordless_types_are_not_offered() {
        let yaml = "concepts:\n  - name: Base\n  - name: A\n    keyword: Alpha\n";
        let catalog = ConceptCatalog::from_yaml(yaml).unwrap();
        let doc = DslDocument::with_text(Arc::new(DslContext::with_catalog(catalog)), "");
        assert_eq!(completion_keywords(&doc, LineCol::ZERO), vec!["Alpha".to_string()]);
    }
}
