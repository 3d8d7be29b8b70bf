//! PDF access and physical line extraction.

mod backend;
mod layout;

pub use backend::{decode_text_simple, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue};
pub use layout::{detect_columns, group_into_lines, Column, LineExtractor, PositionedSpan};

use std::path::Path;

use crate::detect::{sniff_bytes, sniff_path};
use crate::error::Result;
use crate::model::RawLine;

/// Read the physical lines of a PDF file.
pub fn read_lines<P: AsRef<Path>>(path: P, first_page: u32) -> Result<Vec<RawLine>> {
    let path = path.as_ref();
    let header = sniff_path(path)?;
    log::debug!("{}: {}", path.display(), header);
    let backend = LopdfBackend::load_file(path)?;
    Ok(LineExtractor::new(&backend, first_page).extract())
}

/// Read the physical lines of an in-memory PDF.
pub fn read_lines_from_bytes(data: &[u8], first_page: u32) -> Result<Vec<RawLine>> {
    sniff_bytes(data)?;
    let backend = LopdfBackend::load_bytes(data)?;
    Ok(LineExtractor::new(&backend, first_page).extract())
}
