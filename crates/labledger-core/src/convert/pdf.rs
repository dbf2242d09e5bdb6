//! PDF text extraction using lopdf and pdf-extract.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ConversionError;

use super::{extension, DocumentConverter, Result};

/// Extracts the embedded text layer of a PDF.
///
/// Two extraction paths are tried in turn: `pdf-extract`'s layout-aware
/// extractor ("native") and lopdf's content-stream walker. Scanned PDFs without
/// a text layer fail with [`ConversionError::NoTextLayer`].
pub struct PdfTextConverter {
    native_first: bool,
}

impl PdfTextConverter {
    pub fn new() -> Self {
        Self { native_first: true }
    }

    /// Try `pdf-extract` before lopdf (default `true`).
    pub fn with_native_text_first(mut self, native_first: bool) -> Self {
        self.native_first = native_first;
        self
    }

    /// Extract text from PDF bytes.
    pub fn extract_from_mem(&self, data: &[u8]) -> Result<String> {
        let (doc, raw_data) = load_document(data)?;

        let order = if self.native_first {
            [TextPath::Native, TextPath::Lopdf]
        } else {
            [TextPath::Lopdf, TextPath::Native]
        };

        let mut last_error = None;
        for path in order {
            let name = path.name();
            let attempt = match path {
                TextPath::Native => extract_native(&raw_data),
                TextPath::Lopdf => extract_lopdf(&doc),
            };
            match attempt {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("Extracted {} characters with {}", text.len(), name);
                    return Ok(text);
                }
                Ok(_) => debug!("{} returned no text", name),
                Err(e) => {
                    warn!("{} failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ConversionError::NoTextLayer))
    }
}

#[derive(Debug, Clone, Copy)]
enum TextPath {
    Native,
    Lopdf,
}

impl TextPath {
    fn name(self) -> &'static str {
        match self {
            TextPath::Native => "pdf-extract",
            TextPath::Lopdf => "lopdf",
        }
    }
}

impl Default for PdfTextConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for PdfTextConverter {
    fn supports(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("pdf")
    }

    fn convert(&self, path: &Path) -> Result<String> {
        let data = fs::read(path).map_err(|source| ConversionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Converting {} ({} bytes)", path.display(), data.len());
        self.extract_from_mem(&data)
    }
}

/// Parse the document, decrypting it with the empty password when needed.
///
/// Returns the document and bytes suitable for `pdf-extract`, which cannot
/// read encrypted files itself.
fn load_document(data: &[u8]) -> Result<(Document, Vec<u8>)> {
    let mut doc = Document::load_mem(data).map_err(|e| ConversionError::Parse(e.to_string()))?;

    let raw_data = if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(ConversionError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| ConversionError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
        decrypted
    } else {
        data.to_vec()
    };

    if doc.get_pages().is_empty() {
        return Err(ConversionError::NoPages);
    }

    Ok((doc, raw_data))
}

fn extract_native(data: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(data)
        .map_err(|e| ConversionError::TextExtraction(e.to_string()))
}

fn extract_lopdf(doc: &Document) -> Result<String> {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages)
        .map_err(|e| ConversionError::TextExtraction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_pdf_only() {
        let converter = PdfTextConverter::new();
        assert!(converter.supports(Path::new("march/Invoice 12.pdf")));
        assert!(!converter.supports(Path::new("invoice.txt")));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfTextConverter::new()
            .extract_from_mem(b"not a pdf")
            .unwrap_err();
        assert!(matches!(err, ConversionError::Parse(_)));
    }
}
