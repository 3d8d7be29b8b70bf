//! Heading-shape filter.
//!
//! Decides from text alone whether a leveled line reads like a heading or
//! like table, form or body noise.

use regex::Regex;

use crate::config::OutlineConfig;

/// Why a line was rejected as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Form-field label, trailing colon or numbered list item
    TableLabel,
    /// Shorter or longer than the accepted range
    Length,
    /// More words than allowed
    TooManyWords,
    /// No Latin letter at all
    NoLetters,
    /// All caps with digits, or a lone all-caps word
    CapsNoise,
    /// Digits outside a leading section number
    Digits,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Rejection::TableLabel => "table label",
            Rejection::Length => "length out of range",
            Rejection::TooManyWords => "too many words",
            Rejection::NoLetters => "no letters",
            Rejection::CapsNoise => "all-caps noise",
            Rejection::Digits => "embedded digits",
        };
        f.write_str(reason)
    }
}

/// Text rules a heading must satisfy.
pub struct HeadingFilter {
    min_chars: usize,
    max_chars: usize,
    max_words: usize,
    caps_ok_words: usize,
    table_tokens: Vec<String>,
    list_marker: Regex,
    section_number: Regex,
    letter: Regex,
    digit: Regex,
}

impl HeadingFilter {
    /// Create a filter from the config thresholds.
    pub fn new(config: &OutlineConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            max_chars: config.max_chars,
            max_words: config.max_words,
            caps_ok_words: config.caps_ok_words,
            table_tokens: config.table_tokens.iter().map(|t| t.to_lowercase()).collect(),
            list_marker: Regex::new(r"^\d+[.)]\s").unwrap(),
            section_number: Regex::new(r"^\d+(\.\d+)*\s").unwrap(),
            letter: Regex::new(r"[A-Za-z]").unwrap(),
            digit: Regex::new(r"\d").unwrap(),
        }
    }

    /// Whether the text is heading-shaped.
    pub fn is_heading(&self, text: &str) -> bool {
        self.rejection(text).is_none()
    }

    /// The first rule the text breaks, if any.
    pub fn rejection(&self, text: &str) -> Option<Rejection> {
        if self.is_table_label(text) {
            return Some(Rejection::TableLabel);
        }

        let chars = text.chars().count();
        if chars < self.min_chars || chars > self.max_chars {
            return Some(Rejection::Length);
        }

        let words = text.split_whitespace().count();
        if words > self.max_words {
            return Some(Rejection::TooManyWords);
        }

        if !self.letter.is_match(text) {
            return Some(Rejection::NoLetters);
        }

        let has_digit = self.digit.is_match(text);
        if text.to_uppercase() == text && (has_digit || words < self.caps_ok_words) {
            return Some(Rejection::CapsNoise);
        }

        if has_digit && !self.section_number.is_match(text) {
            return Some(Rejection::Digits);
        }

        None
    }

    /// Form-field vocabulary, trailing colon, or a numbered list marker.
    pub fn is_table_label(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let token = lowered.trim_end_matches(':');
        self.table_tokens.iter().any(|t| t == token)
            || text.ends_with(':')
            || self.list_marker.is_match(text)
    }
}
