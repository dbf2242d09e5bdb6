//! Error types for the labledger-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the labledger library.
#[derive(Error, Debug)]
pub enum LabError {
    /// Source document could not be turned into text.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Ledger store error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Statement rendering or publishing error.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Converting or parsing one document panicked.
    #[error("document processing panicked: {0}")]
    Panicked(String),
}

impl LabError {
    /// Whether the error is confined to a single document.
    ///
    /// Document errors are collected for review; everything else means the
    /// output destination is unusable and the batch has to stop.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            LabError::Conversion(_) | LabError::Extraction(_) | LabError::Panicked(_)
        )
    }
}

/// Errors raised while converting a source document to text.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The file type has no converter.
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Every text extraction path failed.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The document has no extractable text layer (scanned image).
    #[error("document has no text layer")]
    NoTextLayer,
}

/// What part of the invoice could not be extracted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    #[error("dentist name not found")]
    DentistNameNotFound,

    #[error("patient or due date not found")]
    PatientOrDateNotFound,

    #[error("invalid date")]
    InvalidDate,

    #[error("no line items")]
    NoLineItems,

    #[error("amount out of range")]
    AmountOutOfRange,
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub detail: String,
}

impl ExtractionError {
    pub fn new(kind: ExtractionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ExtractionErrorKind {
        self.kind
    }
}

/// Errors related to the monthly ledgers.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// I/O error on the ledger file.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Not a `YYYY-MM` month label.
    #[error("invalid month label: {0}")]
    InvalidMonth(String),

    /// The header row matches neither the current nor the legacy layout.
    #[error("unrecognized ledger layout in {path}: {header}")]
    UnknownSchema { path: PathBuf, header: String },

    /// A data row could not be decoded.
    #[error("malformed ledger row {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// The bucket's total does not fit a decimal.
    #[error("total of {0} is out of range")]
    TotalOutOfRange(String),

    /// Two records claim the same key with different contents.
    /// Not raised while key matches overwrite.
    #[error("merge conflict: {0}")]
    MergeConflict(String),
}

/// Errors related to statement rendering and publishing.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The statement total does not fit a decimal.
    #[error("statement total for {0} is out of range")]
    TotalOutOfRange(String),

    /// The PDF writer failed.
    #[error("failed to write PDF: {0}")]
    Pdf(String),

    /// The statement could not be stored.
    #[error("failed to publish statement: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the labledger library.
pub type Result<T> = std::result::Result<T, LabError>;
