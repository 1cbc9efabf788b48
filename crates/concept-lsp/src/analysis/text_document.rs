//! Position index over a document's text.
//!
//! Offsets are byte offsets on char boundaries; `LineCol` columns count
//! chars. A `\r` before `\n` counts as a column of its line.

use std::fmt;

/// Zero-based editor position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

impl LineCol {
    pub const ZERO: LineCol = LineCol { line: 0, col: 0 };

    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Immutable document text with a line start table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    line_starts: Vec<usize>,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Offset of the line's `\n`, or the end of text on the last line.
    fn line_end(&self, line: usize) -> usize {
        self.line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len())
    }

    /// Content of a line without its `\n` (a trailing `\r` is kept).
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        Some(&self.text[start..self.line_end(line)])
    }

    /// Convert a position to an offset, clamping past-the-end lines and
    /// columns.
    pub fn offset_of(&self, position: LineCol) -> usize {
        let Some(&start) = self.line_starts.get(position.line) else {
            return self.text.len();
        };
        let end = self.line_end(position.line);
        self.text[start..end]
            .char_indices()
            .nth(position.col)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    /// Convert an offset to a position. Offsets past the end clamp to the end,
    /// offsets inside a multi-byte char snap to its start.
    pub fn line_col_of(&self, offset: usize) -> LineCol {
        let offset = self.floor_char_boundary(offset);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        LineCol {
            line,
            col: self.text[start..offset].chars().count(),
        }
    }

    /// Position for a column counted in UTF-16 code units, as editors send
    /// them. Columns past the end of the line are kept past the end.
    pub fn position_from_utf16(&self, line: usize, units: usize) -> LineCol {
        let text = self.line(line).unwrap_or_default();
        let mut seen = 0;
        for (col, c) in text.chars().enumerate() {
            if seen >= units {
                return LineCol { line, col };
            }
            seen += c.len_utf16();
        }
        LineCol {
            line,
            col: text.chars().count() + units.saturating_sub(seen),
        }
    }

    /// The same position with its column counted in UTF-16 code units.
    pub fn to_utf16(&self, position: LineCol) -> LineCol {
        let text = self.line(position.line).unwrap_or_default();
        let chars = text.chars().count();
        let units: usize = text.chars().take(position.col).map(char::len_utf16).sum();
        LineCol {
            line: position.line,
            col: units + position.col.saturating_sub(chars),
        }
    }

    /// Text up to and including the first `\n` at or after `offset`, or the
    /// whole text when there is none.
    pub fn truncated_at_next_line_break(&self, offset: usize) -> &str {
        let offset = self.floor_char_boundary(offset);
        match self.text[offset..].find('\n') {
            Some(i) => &self.text[..offset + i + 1],
            None => &self.text,
        }
    }

    /// Render the position's line with a caret underneath.
    pub fn show_position(&self, position: LineCol) -> String {
        let line = self.line(position.line).unwrap_or_default().trim_end_matches('\r');
        format!("{line}\n{}^", " ".repeat(position.col))
    }

    fn floor_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
