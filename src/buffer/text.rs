//! Text utilities for position conversion.
//!
//! Provides efficient byte offset <-> line/column conversion over a buffer
//! snapshot, plus line-level lookups used by the auto-indent policy.

/// A line/column position within a buffer snapshot.
///
/// `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Pre-computed line index for efficient position lookups.
///
/// Stores the byte offset where each line starts; lookups are O(log n)
/// over the line count.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    /// Source text (needed for column calculation).
    source: String,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            line_starts,
            source,
        }
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of lines in the snapshot. An empty snapshot has one line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The line containing the given byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,                    // Exact match (start of line)
            Err(line) => line.saturating_sub(1), // In the middle of a line
        }
    }

    /// Byte offset where the given line starts.
    ///
    /// Returns `None` if the line is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// The text of the given line, without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = self.line_start(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|&next| next - 1) // Exclude newline
            .unwrap_or(self.source.len());
        Some(&self.source[start..end])
    }

    /// The leading whitespace of the given line.
    pub fn line_indent(&self, line: usize) -> &str {
        let Some(text) = self.line_text(line) else {
            return "";
        };
        let end = text
            .char_indices()
            .find(|(_, c)| *c != ' ' && *c != '\t')
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        &text[..end]
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// Uses binary search for the line lookup, then scans the line for the
    /// character column.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let line = self.line_of(offset);
        let line_start = self.line_starts[line];

        let column = self.source[line_start..offset.min(self.source.len())]
            .chars()
            .count();

        Position::new(line, column)
    }

    /// Convert a line/column position to a byte offset.
    ///
    /// Returns `None` if the position is out of bounds. A column at or past
    /// the end of its line clamps to the end of that line.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line_start = self.line_start(position.line)?;
        let line_end = self
            .line_starts
            .get(position.line + 1)
            .map(|&end| end.saturating_sub(1)) // Exclude newline
            .unwrap_or(self.source.len());

        let line_slice = &self.source[line_start..line_end];

        let mut column = 0;
        for (i, _) in line_slice.char_indices() {
            if column >= position.column {
                return Some(line_start + i);
            }
            column += 1;
        }

        // Position is at or past end of line
        Some(line_end.min(self.source.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let idx = LineIndex::new("hello world".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 5));
        assert_eq!(idx.offset_to_position(11), Position::new(0, 11));
    }

    #[test]
    fn multi_line() {
        let idx = LineIndex::new("hello\nworld\ntest".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 5)); // 'o' before newline
        assert_eq!(idx.offset_to_position(6), Position::new(1, 0)); // 'w'
        assert_eq!(idx.offset_to_position(11), Position::new(1, 5)); // 'd' before newline
        assert_eq!(idx.offset_to_position(12), Position::new(2, 0)); // 't'
    }

    #[test]
    fn position_to_offset_round_trip() {
        let idx = LineIndex::new("hello\nworld".to_string());
        assert_eq!(idx.position_to_offset(Position::new(0, 0)), Some(0));
        assert_eq!(idx.position_to_offset(Position::new(0, 5)), Some(5));
        assert_eq!(idx.position_to_offset(Position::new(1, 0)), Some(6));
        assert_eq!(idx.position_to_offset(Position::new(1, 5)), Some(11));
    }

    #[test]
    fn multibyte_columns() {
        // 'é' is 2 bytes in UTF-8 but one column
        let idx = LineIndex::new("aéb".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(1), Position::new(0, 1));
        assert_eq!(idx.offset_to_position(3), Position::new(0, 2));

        assert_eq!(idx.position_to_offset(Position::new(0, 2)), Some(3));
    }

    #[test]
    fn out_of_bounds() {
        let idx = LineIndex::new("hello".to_string());
        assert_eq!(idx.position_to_offset(Position::new(5, 0)), None);
    }

    #[test]
    fn line_lookups() {
        let idx = LineIndex::new("<ul>\n  <li>x</li>\n".to_string());
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.line_text(0), Some("<ul>"));
        assert_eq!(idx.line_text(1), Some("  <li>x</li>"));
        assert_eq!(idx.line_text(2), Some(""));
        assert_eq!(idx.line_indent(0), "");
        assert_eq!(idx.line_indent(1), "  ");
    }

    #[test]
    fn indent_with_tabs() {
        let idx = LineIndex::new("\t\tx".to_string());
        assert_eq!(idx.line_indent(0), "\t\t");
    }
}
