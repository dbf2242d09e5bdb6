//! Source document to text conversion.

mod pdf;
mod text;

pub use pdf::PdfTextConverter;
pub use text::PlainTextConverter;

use std::path::Path;

use crate::error::ConversionError;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Turns a source document into plain text.
pub trait DocumentConverter: Send + Sync {
    /// Whether this converter handles the file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the document's text.
    fn convert(&self, path: &Path) -> Result<String>;
}

/// Lower-cased file extension.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Dispatches on file extension: PDFs and plain text.
pub struct DefaultConverter {
    pdf: PdfTextConverter,
    text: PlainTextConverter,
}

impl DefaultConverter {
    pub fn new() -> Self {
        Self {
            pdf: PdfTextConverter::new(),
            text: PlainTextConverter::new(),
        }
    }

    /// Set which PDF extraction path is tried first.
    pub fn with_native_text_first(mut self, native_first: bool) -> Self {
        self.pdf = self.pdf.with_native_text_first(native_first);
        self
    }
}

impl Default for DefaultConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for DefaultConverter {
    fn supports(&self, path: &Path) -> bool {
        self.pdf.supports(path) || self.text.supports(path)
    }

    fn convert(&self, path: &Path) -> Result<String> {
        if self.pdf.supports(path) {
            self.pdf.convert(path)
        } else if self.text.supports(path) {
            self.text.convert(path)
        } else {
            Err(ConversionError::Unsupported(
                extension(path).unwrap_or_else(|| path.display().to_string()),
            ))
        }
    }
}
