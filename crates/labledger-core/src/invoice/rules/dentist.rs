//! Dentist name extraction from the "INVOICE FOR:" header.
//!
//! One text-extraction path inserts a space between every character of the
//! header ("D R .   J O H N"). The name is therefore rebuilt heuristically:
//!
//! 1. strip every whitespace character,
//! 2. put a space after each period (`DR.` abbreviations),
//! 3. put a space at each lowercase-to-uppercase transition,
//! 4. collapse whitespace runs and trim.
//!
//! The result is lossy. Words written entirely in capitals stay glued together
//! (`DR.JOHNSMITH` becomes `DR. JOHNSMITH`) and mixed-case surnames such as
//! `McDonald` are split (`Mc Donald`). Existing ledgers and statements depend on
//! exactly this output, so the rules must not be changed.

use tracing::debug;

use crate::error::{ExtractionError, ExtractionErrorKind};

use super::patterns::{CASE_BOUNDARY, DENTIST_HEADER, WHITESPACE_RUN};
use super::{FieldExtractor, Result};

/// Dentist name extractor.
pub struct DentistNameExtractor;

impl DentistNameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DentistNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DentistNameExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Result<Self::Output> {
        let caps = DENTIST_HEADER.captures(text).ok_or_else(|| {
            ExtractionError::new(
                ExtractionErrorKind::DentistNameNotFound,
                "no 'INVOICE FOR: ... DESCRIPTION' header",
            )
        })?;

        let raw = caps.name("name").map(|m| m.as_str()).unwrap_or_default();
        let name = reconstruct_name(raw);
        if name.is_empty() {
            return Err(ExtractionError::new(
                ExtractionErrorKind::DentistNameNotFound,
                "header present but name is empty",
            ));
        }

        debug!("Reconstructed dentist name {:?} from {:?}", name, raw.trim());
        Ok(name)
    }
}

/// Rebuild a name from character-spaced header text.
pub fn reconstruct_name(raw: &str) -> String {
    let no_spaces: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let with_period_spaces = no_spaces.replace('.', ". ");
    let with_word_breaks = CASE_BOUNDARY.replace_all(&with_period_spaces, "$1 $2");
    WHITESPACE_RUN
        .replace_all(&with_word_breaks, " ")
        .trim()
        .to_string()
}
