//! Hover handler for the concept Language Server.

use concept_dsl::ConceptMetadata;
use tower_lsp::lsp_types::*;

use super::{to_line_col, to_position};
use crate::analysis::{DslDocument, LineCol};

/// Documentation for the concept keyword active at the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverDescription {
    pub description: String,
    pub start: LineCol,
    pub end: LineCol,
}

pub fn hover_description(document: &DslDocument, position: LineCol) -> Option<HoverDescription> {
    let catalog = document.context().catalog()?;
    let analysis = document.analysis_at(position);

    let keyword = analysis.keyword_token.as_ref()?;
    if analysis.is_after_any_error_line(position) {
        return None;
    }

    let mut description = catalog.description_of(&keyword.value);
    if description.is_empty() {
        description = format!("No documentation found for '{}'.", keyword.value);
    }

    let text = &analysis.text_document;
    let end = match &analysis.next_keyword_token {
        Some(next) => text.line_col_of(next.start.saturating_sub(1)),
        None => position,
    };

    Some(HoverDescription {
        description,
        start: text.line_col_of(keyword.start),
        end,
    })
}

/// Get hover information at position.
pub fn get_hover(document: &DslDocument, position: Position) -> Option<Hover> {
    let line_col = to_line_col(document, position);
    let hover = hover_description(document, line_col)?;
    let text = &document.analysis_at(line_col).text_document;
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover.description,
        }),
        range: Some(Range::new(
            to_position(text, hover.start),
            to_position(text, hover.end),
        )),
    })
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
    fn test_hover_over_keyword() {
        let doc = document("Entity Book { Bool Active; }\n");
        let hover = hover_description(&doc, LineCol::new(0, 16)).unwrap();
        assert!(hover.description.contains("Bool <Name>"));
        assert!(hover.description.contains("Boolean property."));
        assert_eq!(hover.start, LineCol::new(0, 14));
        assert_eq!(hover.end, LineCol::new(0, 24));
    }

    #[test]
    fn test_hover_end_defaults_to_cursor() {
        let doc = document("Entity Book\n");
        let hover = hover_description(&doc, LineCol::new(0, 9)).unwrap();
        assert_eq!(hover.start, LineCol::ZERO);
        assert_eq!(hover.end, LineCol::new(0, 9));
    }

    #[test]
    fn test_hover_without_documentation() {
        let catalog = ConceptCatalog::from_yaml("concepts:\n  - name: A\n    keyword: Alpha\n").unwrap();
        let doc = DslDocument::with_text(Arc::new(DslContext::with_catalog(catalog)), "Alpha;\n");
        let hover = hover_description(&doc, LineCol::new(0, 2)).unwrap();
        assert!(hover.description.starts_with("```\nAlpha\n```"));

        let catalog = ConceptCatalog::from_yaml("concepts: []\n").unwrap();
        let doc = DslDocument::with_text(Arc::new(DslContext::with_catalog(catalog)), "Alpha;\n");
        let hover = hover_description(&doc, LineCol::new(0, 2));
        // Unknown keywords fail the parse on the same line, so no hover.
        assert!(hover.is_none());
    }

    #[test]
    fn test_no_hover_between_concepts() {
        let doc = document("Entity Book;\n\nModule M;\n");
        assert!(hover_description(&doc, LineCol::new(1, 0)).is_none());
    }

    #[test]
    fn test_lsp_hover_range() {
        let doc = document("Module Shop;\n");
        let hover = get_hover(&doc, Position::new(0, 2)).unwrap();
        assert_eq!(hover.range.unwrap().start, Position::new(0, 0));
        assert_eq!(hover.range.unwrap().end, Position::new(0, 10));
    }

    #[test]
    fn test_lsp_hover_range_counts_utf16_units() {
        let doc = document("Entity Book { ItemFilter F '\u{1D11E}\u{1D11E}' \n}\n");
        let hover = get_hover(&doc, Position::new(0, 34)).unwrap();
        let range = hover.range.unwrap();
        assert_eq!(range.start, Position::new(0, 14));
        assert_eq!(range.end, Position::new(0, 34));
    }
}
