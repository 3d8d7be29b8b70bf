//! # pdfoutline
//!
//! Document outline inference for PDF files.
//!
//! The library reads the physical text lines of a PDF, clusters their font
//! sizes into heading tiers and filters out table, form and running-header
//! noise, producing a title plus an H1/H2/H3 outline as JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfoutline::{extract_outline, JsonFormat};
//!
//! fn main() -> pdfoutline::Result<()> {
//!     let outline = extract_outline("document.pdf")?;
//!     println!("{}", outline.to_json(JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Size clustering**: direct ranking or deterministic k-means over font sizes
//! - **Heading filter**: rejects form labels, list items and numeric noise
//! - **Batch mode**: one validated JSON file per PDF in a directory
//! - **Relevance ranking**: persona-driven section ranking over collections

pub mod batch;
pub mod config;
pub mod detect;
pub mod error;
pub mod heading;
pub mod levels;
pub mod model;
pub mod normalize;
pub mod outline;
pub mod parser;
pub mod relevance;
pub mod schema;

// Re-export commonly used types
pub use batch::{BatchReport, BatchRunner, DocumentFailure, DocumentOutcome, DocumentTiming};
pub use config::{ClusterMethod, LevelStrategy, OutlineConfig, RankingConfig, SizePolicy};
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use heading::{HeadingFilter, Rejection};
pub use levels::SizeLevelMap;
pub use model::{
    Heading, HeadingLevel, JsonFormat, Line, Outline, OutlineEntry, RawLine, RawSpan, SizeKey,
};
pub use normalize::LineNormalizer;
pub use outline::Outliner;
pub use relevance::{LexicalScorer, RankingReport, RelevanceScorer};

use std::path::Path;

/// Extract the outline of a PDF file with default heuristics.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::extract_outline;
///
/// let outline = extract_outline("document.pdf").unwrap();
/// println!("{} ({} headings)", outline.title, outline.outline.len());
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    extract_outline_with_config(path, OutlineConfig::default())
}

/// Extract the outline of a PDF file with custom heuristics.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{extract_outline_with_config, OutlineConfig};
///
/// let config = OutlineConfig::new().one_based_pages().largest_gap();
/// let outline = extract_outline_with_config("document.pdf", config).unwrap();
/// ```
pub fn extract_outline_with_config<P: AsRef<Path>>(path: P, config: OutlineConfig) -> Result<Outline> {
    Outliner::new(config)?.extract_file(path)
}

/// Extract the outline of an in-memory PDF.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::extract_outline_from_bytes;
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let outline = extract_outline_from_bytes(&data).unwrap();
/// ```
pub fn extract_outline_from_bytes(data: &[u8]) -> Result<Outline> {
    Outliner::new(OutlineConfig::default())?.extract_bytes(data)
}

/// Extract an outline and serialize it to JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    extract_outline(path)?.to_json(format)
}
