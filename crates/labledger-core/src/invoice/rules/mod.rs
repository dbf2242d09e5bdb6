//! Rule-based field extractors for dental-lab invoices.

pub mod amounts;
pub mod dentist;
pub mod patient;
pub mod patterns;
pub mod table;

pub use amounts::{format_usd, parse_us_amount, scan_amounts};
pub use dentist::{reconstruct_name, DentistNameExtractor};
pub use patient::{PatientDue, PatientExtractor};
pub use table::{LineItemExtractor, TableScan};

use super::Result;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from the full document text.
    fn extract(&self, text: &str) -> Result<Self::Output>;
}

/// A value matched in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Start offset, or 0 when the position is unknown.
    pub fn start(&self) -> usize {
        self.position.map(|(start, _)| start).unwrap_or(0)
    }
}
