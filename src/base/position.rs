//! Row/column positions and ranges.
//!
//! Columns count bytes from the start of the line, matching how the lexer
//! measures tokens. Rows and columns are 0-indexed.

use std::fmt;
use std::ops::{Add, Sub};

use text_size::{TextRange, TextSize};

/// A position in source text (0-indexed row, byte column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub const fn zero() -> Self {
        Self { row: 0, column: 0 }
    }

    /// The extent of `text`: how far the cursor moves when `text` is appended.
    pub fn of_text(text: &str) -> Self {
        match text.rfind('\n') {
            Some(last) => Self {
                row: text.bytes().filter(|&b| b == b'\n').count() as u32,
                column: (text.len() - last - 1) as u32,
            },
            None => Self {
                row: 0,
                column: text.len() as u32,
            },
        }
    }

    /// Subtract, clamping at zero instead of wrapping.
    pub fn saturating_sub(self, other: Point) -> Point {
        if self.row > other.row {
            Point::new(self.row - other.row, self.column)
        } else if self.row == other.row {
            Point::new(0, self.column.saturating_sub(other.column))
        } else {
            Point::zero()
        }
    }
}

/// Extents compose like text concatenation: a later extent with rows resets
/// the column.
impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        if other.row > 0 {
            Point::new(self.row + other.row, other.column)
        } else {
            Point::new(self.row, self.column + other.column)
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        self.saturating_sub(other)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A byte length paired with the row/column extent it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Length {
    pub bytes: TextSize,
    pub extent: Point,
}

impl Length {
    pub const fn zero() -> Self {
        Self {
            bytes: TextSize::new(0),
            extent: Point::zero(),
        }
    }

    pub fn new(bytes: impl Into<TextSize>, extent: Point) -> Self {
        Self {
            bytes: bytes.into(),
            extent,
        }
    }

    /// Length of `text` in bytes and rows/columns.
    pub fn of_text(text: &str) -> Self {
        Self {
            bytes: TextSize::of(text),
            extent: Point::of_text(text),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes == TextSize::new(0)
    }

    /// `self - other`, or zero when `other` is not shorter.
    pub fn saturating_sub(self, other: Length) -> Length {
        if other.bytes < self.bytes {
            Length {
                bytes: self.bytes - other.bytes,
                extent: self.extent.saturating_sub(other.extent),
            }
        } else {
            Length::zero()
        }
    }

    pub(crate) fn byte_usize(&self) -> usize {
        u32::from(self.bytes) as usize
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, other: Length) -> Length {
        Length {
            bytes: self.bytes + other.bytes,
            extent: self.extent + other.extent,
        }
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, other: Length) -> Length {
        self.saturating_sub(other)
    }
}

/// A span of source text in both byte and row/column coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_byte: TextSize,
    pub end_byte: TextSize,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    pub fn new(start: Length, end: Length) -> Self {
        Self {
            start_byte: start.bytes,
            end_byte: end.bytes,
            start_point: start.extent,
            end_point: end.extent,
        }
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::new(self.start_byte, self.end_byte)
    }

    /// Check if a point falls within this range (end inclusive)
    pub fn contains_point(&self, point: Point) -> bool {
        self.start_point <= point && point <= self.end_point
    }
}
