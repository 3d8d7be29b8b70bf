//! Line-level types.

use serde::{Deserialize, Serialize};

/// A positioned run of text in one font, as read from the content stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    /// The text content
    pub text: String,
    /// Effective font size in points
    pub size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font: String,
}

impl RawSpan {
    /// Create a new span.
    pub fn new(text: impl Into<String>, size: f32, font: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size,
            font: font.into(),
        }
    }

    /// Whether the font name indicates a heavy weight.
    pub fn is_bold(&self) -> bool {
        let font = self.font.to_lowercase();
        font.contains("bold") || font.contains("black") || font.contains("heavy")
    }
}

/// One physical line on a page: spans sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    /// Page number
    pub page: u32,
    /// Spans in visual order
    pub spans: Vec<RawSpan>,
}

impl RawLine {
    /// Create a raw line.
    pub fn new(page: u32, spans: Vec<RawSpan>) -> Self {
        Self { page, spans }
    }

    /// Convenience constructor for a single-span line.
    pub fn single(page: u32, text: impl Into<String>, size: f32) -> Self {
        Self::new(page, vec![RawSpan::new(text, size, "Helvetica")])
    }

    /// Largest span size, or 0 if the line has no spans.
    pub fn max_size(&self) -> f32 {
        self.spans.iter().map(|s| s.size).fold(0.0, f32::max)
    }

    /// Size of the first span, or 0 if the line has no spans.
    pub fn first_size(&self) -> f32 {
        self.spans.first().map(|s| s.size).unwrap_or(0.0)
    }

    /// Whether most characters are set in a bold font.
    pub fn is_bold(&self) -> bool {
        let total: usize = self.spans.iter().map(|s| s.text.len()).sum();
        let bold: usize = self
            .spans
            .iter()
            .filter(|s| s.is_bold())
            .map(|s| s.text.len())
            .sum();
        total > 0 && bold * 2 > total
    }
}

/// A cleaned logical text line with its representative font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Normalized text, never empty
    pub text: String,
    /// Page number
    pub page: u32,
    /// Representative font size, always positive
    pub size: f32,
    /// Predominantly bold
    pub bold: bool,
    /// Font of the first span
    pub font: String,
    /// Number of uppercase characters
    pub uppercase_count: usize,
    /// Number of whitespace-separated words
    pub word_count: usize,
}

impl Line {
    /// Create a line, deriving the case and word statistics from the text.
    pub fn new(text: impl Into<String>, page: u32, size: f32) -> Self {
        let text = text.into();
        let uppercase_count = text.chars().filter(|c| c.is_uppercase()).count();
        let word_count = text.split_whitespace().count();
        Self {
            text,
            page,
            size,
            bold: false,
            font: String::new(),
            uppercase_count,
            word_count,
        }
    }

    /// Attach font attributes.
    pub fn with_font(mut self, font: impl Into<String>, bold: bool) -> Self {
        self.font = font.into();
        self.bold = bold;
        self
    }

    /// Quantized size used as a map key.
    pub fn size_key(&self) -> SizeKey {
        SizeKey::from_points(self.size)
    }
}

/// A font size quantized to tenths of a point.
///
/// Sizes coming out of text matrices carry float noise (11.999 vs 12.0);
/// two sizes are the same tier key when they agree to 0.1pt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SizeKey(i32);

impl SizeKey {
    /// Quantize a size in points.
    pub fn from_points(size: f32) -> Self {
        SizeKey((size * 10.0).round() as i32)
    }

    /// Size in points.
    pub fn points(self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl std::fmt::Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}pt", self.points())
    }
}
