//! Line/column positions, ranges and offset conversion.
//!
//! Columns are counted in UTF-16 code units, which is the encoding editor
//! protocols use for positions. Byte offsets are only used internally when
//! slicing the document text.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A zero-based line and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LinePosition {
    pub line: usize,
    pub offset: usize,
}

impl LinePosition {
    pub fn new(line: usize, offset: usize) -> Self {
        Self { line, offset }
    }
}

impl PartialOrd for LinePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.offset.cmp(&other.offset))
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.offset)
    }
}

/// A start/end pair without a file, as used by text edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: LinePosition,
    pub end: LinePosition,
}

impl Span {
    pub fn new(start: LinePosition, end: LinePosition) -> Self {
        Self { start, end }
    }

    pub fn point(position: LinePosition) -> Self {
        Self::new(position, position)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A source range in a named file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub file: String,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl LineRange {
    pub fn new(file: impl Into<String>, start: LinePosition, end: LinePosition) -> Self {
        Self {
            file: file.into(),
            start_line: start.line,
            start_col: start.offset,
            end_line: end.line,
            end_col: end.offset,
        }
    }

    /// Shorthand used heavily by tests: `LineRange::from_coords("main.bal", (1, 0), (3, 1))`.
    pub fn from_coords(
        file: impl Into<String>,
        start: (usize, usize),
        end: (usize, usize),
    ) -> Self {
        Self::new(
            file,
            LinePosition::new(start.0, start.1),
            LinePosition::new(end.0, end.1),
        )
    }

    pub fn start(&self) -> LinePosition {
        LinePosition::new(self.start_line, self.start_col)
    }

    pub fn end(&self) -> LinePosition {
        LinePosition::new(self.end_line, self.end_col)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start(), self.end())
    }

    /// True when `other` lies fully inside `self` (boundaries inclusive).
    pub fn contains(&self, other: &LineRange) -> bool {
        self.file == other.file && self.start() <= other.start() && other.end() <= self.end()
    }

    pub fn contains_position(&self, position: LinePosition) -> bool {
        self.start() <= position && position <= self.end()
    }

    /// True when the ranges share at least one position.
    pub fn intersects(&self, other: &LineRange) -> bool {
        self.file == other.file && self.start() <= other.end() && other.start() <= self.end()
    }

    /// True when `self` ends strictly before `other` starts.
    pub fn ends_before(&self, other: &LineRange) -> bool {
        self.end() < other.start()
    }

    /// Same start and end, ignoring the file name.
    pub fn same_span(&self, other: &LineRange) -> bool {
        self.span() == other.span()
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file, self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// Precomputed line starts for repeated offset/position conversion over one text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a position, or `None` when the position lies outside the text.
    pub fn offset_of(&self, text: &str, position: LinePosition) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line)?;
        let line_end = self
            .line_starts
            .get(position.line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        let line = text.get(line_start..line_end)?;

        let mut units = 0;
        for (byte, ch) in line.char_indices() {
            if units == position.offset {
                return Some(line_start + byte);
            }
            units += ch.len_utf16();
            if units > position.offset {
                // The column points into the middle of a surrogate pair.
                return None;
            }
        }
        (units == position.offset).then_some(line_end)
    }

    /// Position of a byte offset. Offsets past the end clamp to the end of the text.
    pub fn position_of(&self, text: &str, offset: usize) -> LinePosition {
        let mut offset = offset.min(self.len);
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = text[line_start..offset].encode_utf16().count();
        LinePosition::new(line, column)
    }
}

/// Converts a position to a byte offset without keeping an index around.
pub fn to_offset(text: &str, position: LinePosition) -> Option<usize> {
    LineIndex::new(text).offset_of(text, position)
}

/// Converts a byte offset to a position without keeping an index around.
pub fn to_position(text: &str, offset: usize) -> LinePosition {
    LineIndex::new(text).position_of(text, offset)
}
