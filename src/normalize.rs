//! Line normalization: raw spans to cleaned logical lines.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::{OutlineConfig, SizePolicy};
use crate::model::{Line, RawLine};

/// Characters stripped from both ends of a cleaned line.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\u{2013}', '\u{2014}', '-', ':', '\u{2022}', '.'];

const SOFT_HYPHEN: char = '\u{00AD}';

/// Turns raw span groups into [`Line`]s.
pub struct LineNormalizer {
    size_policy: SizePolicy,
    round_sizes: bool,
    broken_word: Regex,
    whitespace: Regex,
    split_letter: Regex,
}

impl LineNormalizer {
    /// Create a normalizer for a config.
    pub fn new(config: &OutlineConfig) -> Self {
        Self {
            size_policy: config.size_policy,
            round_sizes: config.round_sizes,
            broken_word: Regex::new(r"(\w)-\s*\n\s*(\w)").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            split_letter: Regex::new(r"\b([A-Za-z])\s+([A-Za-z]+)").unwrap(),
        }
    }

    /// Normalize every raw line, dropping those that clean to nothing.
    ///
    /// Input order is preserved.
    pub fn normalize(&self, raw: &[RawLine]) -> Vec<Line> {
        let lines: Vec<Line> = raw.iter().filter_map(|r| self.normalize_line(r)).collect();
        log::debug!("normalized {} raw lines into {}", raw.len(), lines.len());
        lines
    }

    /// Normalize one raw line.
    pub fn normalize_line(&self, raw: &RawLine) -> Option<Line> {
        let joined = raw
            .spans
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        let joined = joined.trim();
        if joined.is_empty() {
            return None;
        }

        let text = self.clean_text(joined);
        if text.is_empty() {
            return None;
        }

        let size = self.representative_size(raw);
        if size <= 0.0 {
            return None;
        }

        let font = raw.spans.first().map(|s| s.font.clone()).unwrap_or_default();
        Some(Line::new(text, raw.page, size).with_font(font, raw.is_bold()))
    }

    /// Apply the text cleanup rules to a single string.
    pub fn clean_text(&self, text: &str) -> String {
        let text: String = text.nfkc().filter(|c| *c != SOFT_HYPHEN).collect();
        let text = self.broken_word.replace_all(&text, "$1$2");
        let text = self.whitespace.replace_all(&text, " ");
        let text = self.split_letter.replace_all(&text, "$1$2");
        text.trim_matches(TRIM_CHARS).to_string()
    }

    fn representative_size(&self, raw: &RawLine) -> f32 {
        let size = match self.size_policy {
            SizePolicy::Max => raw.max_size(),
            SizePolicy::FirstSpan => raw.first_size(),
        };
        if self.round_sizes {
            size.round()
        } else {
            size
        }
    }
}
