//! Error types for pdfoutline library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfoutline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting an outline.
///
/// A document with no extractable text is not an error: it produces an
/// empty outline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// The assembled output does not match the outline schema.
    #[error("Schema violation at {path}: {message}")]
    SchemaViolation { path: String, message: String },

    /// A ranking input specification is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid heuristic configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a schema violation for a JSON path.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error means the PDF itself could not be read.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::TextExtract(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
