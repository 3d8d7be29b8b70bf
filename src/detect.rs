//! PDF header sniffing.
//!
//! Files are checked for the `%PDF-x.y` marker before they are handed to
//! the object parser, so a stray non-PDF in a batch fails fast with
//! [`Error::UnknownFormat`] instead of a parser message.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information read from the first bytes of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Declared version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
const HEADER_PROBE: usize = 16;

/// Read the header of a file on disk.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut file = File::open(path)?;
    let mut probe = Vec::with_capacity(HEADER_PROBE);
    file.by_ref()
        .take(HEADER_PROBE as u64)
        .read_to_end(&mut probe)?;
    sniff_bytes(&probe)
}

/// Read the header from the start of an in-memory document.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let rest = data.strip_prefix(PDF_MAGIC).ok_or(Error::UnknownFormat)?;
    if rest.len() < VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    let version = String::from_utf8_lossy(&rest[..VERSION_LEN]).to_string();
    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader { version })
}

/// Whether the bytes start with a usable PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3
        && matches!(bytes[0], b'1' | b'2')
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_valid_header() {
        let header = sniff_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        assert!(matches!(
            sniff_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_bytes(b"%PDF"), Err(Error::UnknownFormat)));
        assert!(matches!(sniff_bytes(b""), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_rejects_bad_version() {
        assert!(matches!(
            sniff_bytes(b"%PDF-9.x\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_sniff_short_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        assert_eq!(sniff_path(&path).unwrap().version, "1.4");
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }
}
