//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Line item extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Totals arithmetic error.
    #[error("totals error: {0}")]
    Totals(#[from] TotalsError),

    /// Receipt form error.
    #[error("form error: {0}")]
    Form(#[from] FormError),

    /// Tabular export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is available in this build or configuration.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while setting up line item extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A configured pattern failed to compile.
    #[error("invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while totalling a receipt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsError {
    /// A sum or product left the representable decimal range.
    #[error("amounts too large to total")]
    Overflow,
}

/// Errors related to the per-session receipt form.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    /// Row index outside the current form.
    #[error("no item row at index {index} (form has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    /// Submission without a single valid item.
    #[error("please provide at least one valid item")]
    NoValidItems,

    /// The valid rows cannot be totalled.
    #[error("{0}")]
    Totals(#[from] TotalsError),
}

/// Errors related to tabular export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export.
    #[error("no data available for download")]
    Empty,

    /// A merged table lacks a required column.
    #[error("merged table has no {0} column")]
    MissingColumn(&'static str),

    /// A merged table cell could not be read.
    #[error("invalid {column} value '{value}' on line {line}")]
    Field {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// Exported bytes were not valid UTF-8.
    #[error("invalid UTF-8 in exported table: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
