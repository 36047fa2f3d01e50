//! Byte spans and offset-to-line conversion.

use std::ops::Range;

/// Half-open `[start, end)` byte range into a scanned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    /// First byte of the range.
    pub start: usize,
    /// One past the last byte of the range.
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} is past end {end}");
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    #[must_use]
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice the buffer this span was produced from.
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Span translated to be relative to `origin`.
    #[must_use]
    pub fn relative_to(&self, origin: usize) -> Span {
        Span::new(self.start - origin, self.end - origin)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// Converts byte offsets into 1-indexed line and column numbers.
///
/// Built once per document; lookups are a binary search over line starts.
///
/// # Example
///
/// ```
/// use shortcode_core::LineIndex;
///
/// let index = LineIndex::new("first\nsecond <<x>>");
/// assert_eq!(index.line_col(13), (2, 8));
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    /// 1-indexed line containing `offset`.
    #[must_use]
    pub fn line(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// 1-indexed `(line, column)` of `offset`. Columns count bytes.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line(offset);
        let line_start = self.line_starts[line - 1];
        (line, offset - line_start + 1)
    }
}
