//! Heuristic tunables for outline extraction and section ranking.
//!
//! Every threshold used by the pipeline lives here. A config is built once
//! and passed by reference into each per-document call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options controlling line normalization, level assignment and heading filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Number of heading tiers (H1..Hn, at most 3)
    pub num_levels: usize,

    /// Minimum heading length in characters
    pub min_chars: usize,

    /// Maximum heading length in characters
    pub max_chars: usize,

    /// Maximum words in a heading
    pub max_words: usize,

    /// Minimum words for the first-page H1 to become the title
    pub title_min_words: usize,

    /// All-caps headings need at least this many words
    pub caps_ok_words: usize,

    /// Lines sharing a (page, size) pair more often than this are table rows
    pub max_per_size: usize,

    /// Form-field labels that are never headings (compared lowercase)
    pub table_tokens: Vec<String>,

    /// How a line's representative size is chosen from its spans
    pub size_policy: SizePolicy,

    /// Round representative sizes to whole points
    pub round_sizes: bool,

    /// Whether the smallest size tier gets a heading level
    pub level_strategy: LevelStrategy,

    /// How distinct sizes are partitioned into tiers
    pub cluster_method: ClusterMethod,

    /// Number given to the first page (0 or 1)
    pub first_page: u32,

    /// Run the heading-shape filter on leveled lines
    pub apply_heading_filter: bool,
}

impl OutlineConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (possibly partial) config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of heading tiers.
    pub fn with_num_levels(mut self, levels: usize) -> Self {
        self.num_levels = levels;
        self
    }

    /// Set the accepted heading length range in characters.
    pub fn with_char_range(mut self, min: usize, max: usize) -> Self {
        self.min_chars = min;
        self.max_chars = max;
        self
    }

    /// Set the word limit for headings.
    pub fn with_max_words(mut self, words: usize) -> Self {
        self.max_words = words;
        self
    }

    /// Set the repetition threshold of the (page, size) pre-filter.
    pub fn with_max_per_size(mut self, count: usize) -> Self {
        self.max_per_size = count;
        self
    }

    /// Set the representative size policy.
    pub fn with_size_policy(mut self, policy: SizePolicy) -> Self {
        self.size_policy = policy;
        self
    }

    /// Round sizes to whole points.
    pub fn rounded_sizes(mut self) -> Self {
        self.round_sizes = true;
        self
    }

    /// Set the level strategy.
    pub fn with_level_strategy(mut self, strategy: LevelStrategy) -> Self {
        self.level_strategy = strategy;
        self
    }

    /// Set the clustering method.
    pub fn with_cluster_method(mut self, method: ClusterMethod) -> Self {
        self.cluster_method = method;
        self
    }

    /// Partition sizes at the widest gaps instead of k-means.
    pub fn largest_gap(mut self) -> Self {
        self.cluster_method = ClusterMethod::LargestGap;
        self
    }

    /// Number pages from 1 instead of 0.
    pub fn one_based_pages(mut self) -> Self {
        self.first_page = 1;
        self
    }

    /// Disable the heading-shape filter.
    pub fn without_heading_filter(mut self) -> Self {
        self.apply_heading_filter = false;
        self
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.num_levels) {
            return Err(Error::Config(format!(
                "num_levels must be between 1 and 3, got {}",
                self.num_levels
            )));
        }
        if self.min_chars > self.max_chars {
            return Err(Error::Config(format!(
                "min_chars ({}) exceeds max_chars ({})",
                self.min_chars, self.max_chars
            )));
        }
        if self.max_words == 0 {
            return Err(Error::Config("max_words must be positive".to_string()));
        }
        if self.first_page > 1 {
            return Err(Error::Config(format!(
                "first_page must be 0 or 1, got {}",
                self.first_page
            )));
        }
        Ok(())
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            num_levels: 3,
            min_chars: 4,
            max_chars: 70,
            max_words: 10,
            title_min_words: 2,
            caps_ok_words: 2,
            max_per_size: 6,
            table_tokens: ["s.no", "age", "relationship", "name", "date", "signature"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            size_policy: SizePolicy::Max,
            round_sizes: false,
            level_strategy: LevelStrategy::AllTiers,
            cluster_method: ClusterMethod::KMeans,
            first_page: 0,
            apply_heading_filter: true,
        }
    }
}

/// Representative font size of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePolicy {
    /// Largest span size on the line
    #[default]
    Max,
    /// Size of the first span
    FirstSpan,
}

/// Which size tiers receive heading levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStrategy {
    /// Every distinct size is mapped to H1..Hn
    #[default]
    AllTiers,
    /// One extra tier is clustered and treated as body text
    BodyExcluded,
}

/// One-dimensional partitioning of distinct sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Lloyd iteration with quantile-seeded centroids
    #[default]
    KMeans,
    /// Split at the widest gaps between sorted sizes
    LargestGap,
}

/// Options for the section ranking stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Sections kept in the ranked output
    pub top_n: usize,

    /// Passages must be longer than this to be refined
    pub min_passage_chars: usize,

    /// Passages must score above this to be kept
    pub similarity_threshold: f32,

    /// Spans must be longer than this (trimmed) to count
    pub min_span_chars: usize,

    /// Section text must be longer than this
    pub min_section_chars: usize,

    /// Section text must be shorter than this
    pub max_section_chars: usize,

    /// Section titles are cut to this many characters
    pub title_chars: usize,
}

impl RankingConfig {
    /// Create a ranking config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many sections are kept.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the refinement similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            min_passage_chars: 80,
            similarity_threshold: 0.3,
            min_span_chars: 5,
            min_section_chars: 10,
            max_section_chars: 300,
            title_chars: 120,
        }
    }
}
