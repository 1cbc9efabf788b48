//! Diagnostics handler: analysis errors as editor diagnostics.

use tower_lsp::lsp_types::*;

use super::lsp_position;
use crate::analysis::{AnalysisResult, ErrorSeverity, LineCol};

/// A diagnostic in editor coordinates: columns count UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentDiagnostic {
    pub start: LineCol,
    pub end: LineCol,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Map every error of an analysis to a diagnostic. The range ends at the end
/// of the token at the error position, or is empty when there is none.
pub fn document_diagnostics(analysis: &AnalysisResult) -> Vec<DocumentDiagnostic> {
    analysis
        .all_errors()
        .map(|error| {
            let text = &analysis.text_document;
            let end = analysis
                .token_at(error.line_col)
                .map(|token| text.line_col_of(token.end))
                .unwrap_or(error.line_col);
            DocumentDiagnostic {
                start: text.to_utf16(error.line_col),
                end: text.to_utf16(end),
                message: error.message.clone(),
                severity: error.severity,
            }
        })
        .collect()
}

pub fn to_lsp_diagnostic(diagnostic: &DocumentDiagnostic) -> Diagnostic {
    Diagnostic {
        range: Range::new(lsp_position(diagnostic.start), lsp_position(diagnostic.end)),
        severity: Some(match diagnostic.severity {
            ErrorSeverity::Error => DiagnosticSeverity::ERROR,
            ErrorSeverity::Warning => DiagnosticSeverity::WARNING,
        }),
        source: Some("concept-lsp".to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, AnalysisRun, TextDocument};
    use concept_dsl::ConceptCatalog;
    use pretty_assertions::assert_eq;

    fn analyse(text: &str) -> AnalysisResult {
        let catalog = ConceptCatalog::builtin().unwrap();
        AnalysisRun::new(&catalog, &TextDocument::new(text)).run_for_document()
    }

    #[test]
    fn test_error_range_covers_token() {
        let diagnostics = document_diagnostics(&analyse("Module Shop;\nEntity Book { Short Name; }\n"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, LineCol::new(1, 14));
        assert_eq!(diagnostics[0].end, LineCol::new(1, 19));
        assert_eq!(diagnostics[0].severity, ErrorSeverity::Error);
    }

    #[test]
    fn test_error_without_token_has_empty_range() {
        let diagnostics = document_diagnostics(&analyse("Entity \"Book\n"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, diagnostics[0].end);
        assert!(diagnostics[0].message.contains("Missing closing character"));
    }

    #[test]
    fn test_clean_document_has_no_diagnostics() {
        assert!(document_diagnostics(&analyse("Module Shop { Entity Book; }\n")).is_empty());
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let diagnostics = document_diagnostics(&analyse("Entity '\u{1D11E}' { Short Name; }\n"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, LineCol::new(0, 14));
        assert_eq!(diagnostics[0].end, LineCol::new(0, 19));
    }

    #[test]
    fn test_lsp_conversion() {
        let diagnostic = DocumentDiagnostic {
            start: LineCol::new(2, 1),
            end: LineCol::new(2, 4),
            message: "bad".into(),
            severity: ErrorSeverity::Warning,
        };
        let lsp = to_lsp_diagnostic(&diagnostic);
        assert_eq!(lsp.range, Range::new(Position::new(2, 1), Position::new(2, 4)));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(lsp.message, "bad");
    }

    #[test]
    fn test_warning_severity_is_kept() {
        let mut analysis = analyse("Entity Book;\n");
        analysis.parser_errors.push(AnalysisError {
            line_col: LineCol::new(0, 0),
            message: "odd".into(),
            severity: ErrorSeverity::Warning,
        });
        let diagnostics = document_diagnostics(&analysis);
        assert_eq!(diagnostics[0].severity, ErrorSeverity::Warning);
        assert_eq!(diagnostics[0].end, LineCol::new(0, 6));
    }
}
