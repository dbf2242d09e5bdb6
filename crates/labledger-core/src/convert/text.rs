//! Plain-text documents (already converted invoices).

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ConversionError;

use super::{extension, DocumentConverter, Result};

/// Reads `.txt` files as they are.
#[derive(Debug, Default)]
pub struct PlainTextConverter;

impl PlainTextConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for PlainTextConverter {
    fn supports(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("txt") | Some("text"))
    }

    fn convert(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|source| ConversionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        debug!("Read {} characters from {}", text.len(), path.display());

        if text.trim().is_empty() {
            return Err(ConversionError::NoTextLayer);
        }
        Ok(text)
    }
}
