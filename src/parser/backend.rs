//! PDF backend abstraction.
//!
//! The line extractor only needs page order, font names, decoded content
//! operations and string decoding. [`PdfBackend`] exposes exactly that, so
//! the extractor can be driven by lopdf in production and by scripted
//! operations in tests.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// An operand of a content stream operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value of an integer or real operand.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A single operation from a content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Create an operation.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// Numeric operand at `idx`, or `default` when missing or not numeric.
    pub fn number(&self, idx: usize, default: f32) -> f32 {
        self.operands
            .get(idx)
            .and_then(PdfValue::as_number)
            .unwrap_or(default)
    }
}

/// Read access to a PDF's pages and text.
pub trait PdfBackend {
    /// Page ids in reading order.
    fn page_ids(&self) -> Vec<PageId>;

    /// Map of font resource key to base font name for a page.
    fn font_names(&self, page: PageId) -> Result<HashMap<Vec<u8>, String>>;

    /// Decoded content stream operations of a page.
    fn operations(&self, page: PageId) -> Result<Vec<ContentOp>>;

    /// Decode a string operand with the encoding of `font_key` on `page`.
    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String;

    /// Summed glyph widths of a string operand, in thousandths of an em.
    ///
    /// `None` when the font carries no usable width table; callers then
    /// estimate from the character count.
    fn glyph_widths(&self, _page: PageId, _font_key: &[u8], _bytes: &[u8]) -> Option<f32> {
        None
    }
}

/// Decoding used when a font has no usable encoding.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_document(LopdfDocument::load(path)?))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::from_document(LopdfDocument::load_mem(data)?))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        // Owner-password-only files still decode; text from anything else comes out empty.
        if doc.is_encrypted() {
            log::warn!("document is encrypted, extracted text may be incomplete");
        }
        Self { doc }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }
}

impl PdfBackend for LopdfBackend {
    fn page_ids(&self) -> Vec<PageId> {
        // BTreeMap keyed by 1-based page number, so values come out in order.
        self.doc.get_pages().into_values().collect()
    }

    fn font_names(&self, page: PageId) -> Result<HashMap<Vec<u8>, String>> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(format!("cannot read page fonts: {}", e)))?;

        Ok(fonts
            .into_iter()
            .map(|(key, dict)| {
                let base_font = dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(&key).to_string());
                (key, base_font)
            })
            .collect())
    }

    fn operations(&self, page: PageId) -> Result<Vec<ContentOp>> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| Error::TextExtract(format!("cannot read page content: {}", e)))?;
        let content = lopdf::content::Content::decode(&data)
            .map_err(|e| Error::TextExtract(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page) {
            if let Some(font) = fonts.get(font_key) {
                if let Ok(encoding) = font.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn glyph_widths(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> Option<f32> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font = fonts.get(font_key)?;
        // Composite fonts use multi-byte codes and a /W array instead.
        let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        if matches!(subtype, Some(name) if name == b"Type0") {
            return None;
        }

        let first_char = font.get(b"FirstChar").ok()?.as_i64().ok()?;
        let (_, widths) = self.doc.dereference(font.get(b"Widths").ok()?).ok()?;
        let widths = widths.as_array().ok()?;

        let total = bytes
            .iter()
            .map(|&code| {
                usize::try_from(code as i64 - first_char)
                    .ok()
                    .and_then(|idx| widths.get(idx))
                    .and_then(|w| w.as_float().ok())
                    .unwrap_or(MISSING_GLYPH_WIDTH)
            })
            .sum();
        Some(total)
    }
}

/// Width assumed for codes outside a font's width table.
const MISSING_GLYPH_WIDTH: f32 = 500.0;

fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Number(*i as f32),
        Object::Real(r) => PdfValue::Number(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}
