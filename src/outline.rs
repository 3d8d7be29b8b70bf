//! Outline assembly: the end-to-end pipeline for one document.

use std::collections::HashMap;
use std::path::Path;

use crate::config::OutlineConfig;
use crate::error::Result;
use crate::heading::HeadingFilter;
use crate::levels::{filter_repeated_sizes, SizeLevelMap};
use crate::model::{Heading, HeadingLevel, Line, Outline, RawLine};
use crate::normalize::LineNormalizer;
use crate::parser;

/// Extracts outlines with one fixed configuration.
///
/// Build once and reuse for every document in a run; it holds no
/// per-document state.
pub struct Outliner {
    config: OutlineConfig,
    normalizer: LineNormalizer,
    filter: HeadingFilter,
}

impl Outliner {
    /// Create an outliner, rejecting an unusable config.
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: LineNormalizer::new(&config),
            filter: HeadingFilter::new(&config),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Extract the outline of a PDF file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Outline> {
        let raw = parser::read_lines(path, self.config.first_page)?;
        Ok(self.outline_from_raw(&raw))
    }

    /// Extract the outline of an in-memory PDF.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<Outline> {
        let raw = parser::read_lines_from_bytes(data, self.config.first_page)?;
        Ok(self.outline_from_raw(&raw))
    }

    /// Build the outline from physical lines.
    pub fn outline_from_raw(&self, raw: &[RawLine]) -> Outline {
        self.outline_from_lines(self.normalizer.normalize(raw))
    }

    /// Build the outline from normalized lines.
    pub fn outline_from_lines(&self, lines: Vec<Line>) -> Outline {
        if lines.is_empty() {
            return Outline::empty();
        }
        let headings = self.headings(lines);
        assemble(headings, &self.config)
    }

    /// Leveled lines that pass the heading filter, in document order.
    pub fn headings(&self, lines: Vec<Line>) -> Vec<Heading> {
        let candidates = filter_repeated_sizes(lines, self.config.max_per_size);
        let levels = SizeLevelMap::build(&candidates, &self.config).promote(&candidates);

        candidates
            .into_iter()
            .filter_map(|line| {
                let level = levels.level(line.size_key())?;
                if self.config.apply_heading_filter {
                    if let Some(reason) = self.filter.rejection(&line.text) {
                        log::debug!("rejected {:?}: {}", line.text, reason);
                        return None;
                    }
                }
                Some(Heading {
                    level,
                    text: line.text,
                    page: line.page,
                    size: line.size,
                })
            })
            .collect()
    }
}

/// Pick the title, drop repeated texts and emit the ordered outline.
///
/// The title is the first H1 on the first page with enough words. It is
/// reported on its own and left out of the outline. Any text appearing more
/// than once is treated as a running header or label and dropped entirely.
pub fn assemble(headings: Vec<Heading>, config: &OutlineConfig) -> Outline {
    let title_idx = headings.iter().position(|h| {
        h.level == HeadingLevel::H1
            && h.page == config.first_page
            && h.text.split_whitespace().count() >= config.title_min_words
    });
    let title = title_idx
        .map(|i| headings[i].text.clone())
        .unwrap_or_default();

    let mut freq: HashMap<String, usize> = HashMap::new();
    for h in &headings {
        *freq.entry(h.text.clone()).or_insert(0) += 1;
    }

    let outline = headings
        .into_iter()
        .enumerate()
        .filter(|(i, h)| Some(*i) != title_idx && freq[&h.text] == 1)
        .map(|(_, h)| h.into())
        .collect::<Vec<_>>();

    log::debug!(
        "title {:?}, {} outline entries",
        title,
        outline.len()
    );
    Outline { title, outline }
}
