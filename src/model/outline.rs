//! Heading and outline types.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Structural rank of a heading.
///
/// Ordering follows importance: `H1 < H2 < H3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// All levels, most important first.
    pub const ALL: [HeadingLevel; 3] = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3];

    /// Level for a zero-based tier rank; ranks past H3 collapse into H3.
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => HeadingLevel::H1,
            1 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }

    /// Parse a tag such as `"H2"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "H1" => Some(HeadingLevel::H1),
            "H2" => Some(HeadingLevel::H2),
            "H3" => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    /// The tag written to JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }

    /// Numeric depth (1 for H1).
    pub fn depth(self) -> u8 {
        self as u8 + 1
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate line that received a level.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
    pub size: f32,
}

/// One entry of the emitted outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

impl From<Heading> for OutlineEntry {
    fn from(h: Heading) -> Self {
        Self {
            level: h.level,
            text: h.text,
            page: h.page,
        }
    }
}

/// Title plus ordered heading list for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Document title, empty when none was found
    pub title: String,
    /// Headings in document order
    pub outline: Vec<OutlineEntry>,
}

impl Outline {
    /// The outline of a document with nothing to report.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether neither a title nor any heading was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.outline.is_empty()
    }

    /// Number of entries at a level.
    pub fn count_at(&self, level: HeadingLevel) -> usize {
        self.outline.iter().filter(|e| e.level == level).count()
    }

    /// Serialize to JSON text.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let json = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self)?,
            JsonFormat::Compact => serde_json::to_string(self)?,
        };
        Ok(json)
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}
