//! Source positions for ADQL tokens and tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Position of a construct in the query text.
///
/// Lines and columns are 1-based; the end column is exclusive (it points
/// just after the last character of the construct). Columns count
/// characters, not bytes, and tabs are not expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextPosition {
    pub begin_line: u32,
    pub begin_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl TextPosition {
    pub const fn new(begin_line: u32, begin_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            begin_line,
            begin_column,
            end_line,
            end_column,
        }
    }

    /// A position covering a single character
    pub const fn single(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column + 1)
    }

    /// Smallest position covering both `self` and `other`
    pub fn merge(self, other: Self) -> Self {
        let (begin_line, begin_column) = (self.begin_line, self.begin_column)
            .min((other.begin_line, other.begin_column));
        let (end_line, end_column) =
            (self.end_line, self.end_column).max((other.end_line, other.end_column));
        Self::new(begin_line, begin_column, end_line, end_column)
    }

    /// Check whether `other` lies entirely inside this position
    pub fn contains(&self, other: &Self) -> bool {
        (self.begin_line, self.begin_column) <= (other.begin_line, other.begin_column)
            && (other.end_line, other.end_column) <= (self.end_line, self.end_column)
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.begin_line == self.end_line {
            write!(
                f,
                "line {}, columns {}-{}",
                self.begin_line, self.begin_column, self.end_column
            )
        } else {
            write!(
                f,
                "line {}, column {} to line {}, column {}",
                self.begin_line, self.begin_column, self.end_line, self.end_column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_spans_lines() {
        let a = TextPosition::new(1, 8, 1, 12);
        let b = TextPosition::new(2, 1, 2, 5);
        assert_eq!(a.merge(b), TextPosition::new(1, 8, 2, 5));
        assert_eq!(b.merge(a), TextPosition::new(1, 8, 2, 5));
    }

    #[test]
    fn test_contains() {
        let outer = TextPosition::new(1, 1, 1, 30);
        assert!(outer.contains(&TextPosition::new(1, 8, 1, 12)));
        assert!(!outer.contains(&TextPosition::new(1, 8, 2, 1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(TextPosition::single(3, 7).to_string(), "line 3, columns 7-8");
        assert_eq!(
            TextPosition::new(1, 2, 4, 1).to_string(),
            "line 1, column 2 to line 4, column 1"
        );
    }
}
