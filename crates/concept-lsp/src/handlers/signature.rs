//! Signature help handler.

use concept_dsl::{ConceptMetadata, ConceptSignature};
use tower_lsp::lsp_types::*;

use super::to_line_col;
use crate::analysis::{DslDocument, LineCol};

/// Signatures for the active keyword, best match first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHelpInfo {
    pub signatures: Vec<ConceptSignature>,
    pub active_signature: Option<usize>,
    pub active_parameter: Option<usize>,
}

struct Candidate<'a> {
    type_name: &'a str,
    active: usize,
    total: usize,
    signature: usize,
}

impl Candidate<'_> {
    /// Concepts with all members typed rank last, then fewer members first.
    fn rank(&self) -> (bool, usize, &str) {
        (self.active >= self.total, self.total, self.type_name)
    }
}

pub fn signature_help(document: &DslDocument, position: LineCol) -> Option<SignatureHelpInfo> {
    let catalog = document.context().catalog()?;
    let analysis = document.analysis_at(position);

    let keyword = analysis.keyword_token.as_ref()?;
    if analysis.is_after_any_error_line(position) {
        return None;
    }

    let signatures = catalog.signatures_of(&keyword.value);
    let valid = analysis.valid_concepts_with_active_parameter();

    let mut candidates: Vec<Candidate<'_>> = valid
        .iter()
        .filter_map(|(concept, active)| {
            let signature = signatures
                .iter()
                .position(|s| s.concept_type == concept.type_name())?;
            Some(Candidate {
                type_name: concept.type_name(),
                active: *active,
                total: catalog.parameters_of(concept.type_name()).len(),
                signature,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Some(SignatureHelpInfo {
            signatures,
            active_signature: None,
            active_parameter: None,
        });
    }

    // Stable sort: exact ties keep catalog order.
    candidates.sort_by(|a, b| a.rank().cmp(&b.rank()));
    if candidates.windows(2).any(|pair| pair[0].rank() == pair[1].rank()) {
        tracing::warn!(
            "Signature help for '{}' has candidates that tie on every sort key",
            keyword.value
        );
    }

    let active_parameter = candidates[0].active;
    let mut order: Vec<usize> = candidates.iter().map(|c| c.signature).collect();
    let remaining: Vec<usize> = (0..signatures.len())
        .filter(|i| !order.contains(i))
        .collect();
    order.extend(remaining);

    let mut slots: Vec<Option<ConceptSignature>> = signatures.into_iter().map(Some).collect();
    let signatures = order.into_iter().filter_map(|i| slots[i].take()).collect();

    Some(SignatureHelpInfo {
        signatures,
        active_signature: Some(0),
        active_parameter: Some(active_parameter),
    })
}

/// Get signature help at position.
pub fn get_signature_help(document: &DslDocument, position: Position) -> Option<SignatureHelp> {
    let help = signature_help(document, to_line_col(document, position))?;

    let signatures = help
        .signatures
        .iter()
        .map(|signature| SignatureInformation {
            label: signature.signature.clone(),
            documentation: (!signature.documentation.is_empty()).then(|| {
                Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: signature.documentation.clone(),
                })
            }),
            parameters: Some(parameter_information(signature)),
            active_parameter: None,
        })
        .collect();

    Some(SignatureHelp {
        signatures,
        active_signature: help.active_signature.map(|i| i as u32),
        active_parameter: help.active_parameter.map(|i| i as u32),
    })
}

/// Parameter labels as UTF-16 offsets into the signature label.
fn parameter_information(signature: &ConceptSignature) -> Vec<ParameterInformation> {
    let label = &signature.signature;
    let mut search_from = 0;

    signature
        .parameters
        .iter()
        .map(|member| {
            let text = member.label();
            let parameter_label = match label[search_from..].find(&text) {
                Some(found) => {
                    let start = search_from + found;
                    search_from = start + text.len();
                    let utf16_start = label[..start].encode_utf16().count() as u32;
                    let utf16_end = utf16_start + text.encode_utf16().count() as u32;
                    ParameterLabel::LabelOffsets([utf16_start, utf16_end])
                }
                None => ParameterLabel::Simple(text),
            };
            ParameterInformation {
                label: parameter_label,
                documentation: member.description.clone().map(Documentation::String),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DslContext;
    use concept_dsl::ConceptCatalog;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn document(text: &str) -> DslDocument {
        let context = Arc::new(DslContext::with_catalog(ConceptCatalog::builtin().unwrap()));
        DslDocument::with_text(context, text)
    }

    fn signature_names(help: &SignatureHelpInfo) -> Vec<&str> {
        help.signatures.iter().map(|s| s.concept_type.as_str()).collect()
    }

    #[test]
    fn test_partial_reference_prefers_longer_signature() {
        let doc = document("Entity Book { Reference Author \n}\n");
        let help = signature_help(&doc, LineCol::new(0, 31)).unwrap();
        assert_eq!(
            signature_names(&help),
            vec!["ReferencePropertyInfo", "SimpleReferencePropertyInfo"]
        );
        assert_eq!(help.active_signature, Some(0));
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn test_keyword_only_prefers_fewer_members() {
        let doc = document("Module Shop { Browse Books \n}\n");
        let help = signature_help(&doc, LineCol::new(0, 21)).unwrap();
        assert_eq!(signature_names(&help), vec!["BrowseDataStructureInfo"]);
        assert_eq!(help.active_parameter, Some(1));

        let doc = document("Module Shop { Browse Books Shop.Book { Take \n}}\n");
        let help = signature_help(&doc, LineCol::new(0, 44)).unwrap();
        assert_eq!(signature_names(&help), vec!["BrowseTakeInfo", "BrowseTakeNamedInfo"]);
        assert_eq!(help.active_parameter, Some(0));
    }

    #[test]
    fn test_remaining_signatures_follow_candidates() {
        let doc = document("Module Shop { Browse Books Shop.Book { Take A B \n}}\n");
        let help = signature_help(&doc, LineCol::new(0, 48)).unwrap();
        assert_eq!(signature_names(&help), vec!["BrowseTakeNamedInfo", "BrowseTakeInfo"]);
        assert_eq!(help.active_signature, Some(0));
        assert_eq!(help.active_parameter, Some(2));
    }

    #[test]
    fn test_without_candidates_returns_all_signatures() {
        // Member-less concepts never report a member read.
        let doc = document("Entity Book { Deactivatable\n}\n");
        let help = signature_help(&doc, LineCol::new(0, 16)).unwrap();
        assert_eq!(signature_names(&help), vec!["DeactivatableInfo"]);
        assert_eq!(help.active_signature, None);
        assert_eq!(help.active_parameter, None);
    }

    #[test]
    fn test_no_help_without_keyword_or_after_error() {
        assert!(signature_help(&document(""), LineCol::ZERO).is_none());
        let doc = document("Entity Book; Nope x;\nEntity Other\n");
        assert!(signature_help(&doc, LineCol::new(1, 8)).is_none());
    }

    #[test]
    fn test_lsp_parameter_offsets() {
        let doc = document("Entity Book { Reference Author \n}\n");
        let help = get_signature_help(&doc, Position::new(0, 31)).unwrap();
        let first = &help.signatures[0];
        assert_eq!(first.label, "Reference <Name> <Target.>");
        let params = first.parameters.as_ref().unwrap();
        assert_eq!(params[0].label, ParameterLabel::LabelOffsets([10, 16]));
        assert_eq!(params[1].label, ParameterLabel::LabelOffsets([17, 26]));
        assert_eq!(help.active_parameter, Some(1));
    }
}
