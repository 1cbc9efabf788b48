//! LSP request handlers.
//!
//! Each handler exposes a protocol-independent query over a [`DslDocument`]
//! plus a conversion into `lsp_types`.
//!
//! [`DslDocument`]: crate::analysis::DslDocument

pub mod completion;
pub mod diagnostics;
pub mod hover;
pub mod signature;

use tower_lsp::lsp_types::Position;

use crate::analysis::{DslDocument, LineCol, TextDocument};

/// Editor position to `LineCol`. LSP columns are UTF-16 code units.
pub fn to_line_col(document: &DslDocument, position: Position) -> LineCol {
    document.with_text_document(|text| {
        text.position_from_utf16(position.line as usize, position.character as usize)
    })
}

/// `LineCol` in `text` to an editor position.
pub fn to_position(text: &TextDocument, line_col: LineCol) -> Position {
    lsp_position(text.to_utf16(line_col))
}

/// A position whose column is already in UTF-16 code units.
pub fn lsp_position(line_col: LineCol) -> Position {
    Position::new(
        u32::try_from(line_col.line).unwrap_or(u32::MAX),
        u32::try_from(line_col.col).unwrap_or(u32::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DslContext;
    use std::sync::Arc;

    #[test]
    fn test_positions_use_utf16_columns() {
        let doc = DslDocument::with_text(Arc::new(DslContext::new()), "'\u{1D11E}' Module\n");
        assert_eq!(to_line_col(&doc, Position::new(0, 5)), LineCol::new(0, 4));
        let text = doc.text_document();
        assert_eq!(to_position(&text, LineCol::new(0, 4)), Position::new(0, 5));
        assert_eq!(lsp_position(LineCol::new(1, 2)), Position::new(1, 2));
    }
}
