//! Rule-based invoice parser: normalize, extract fields, aggregate.

use std::time::Instant;

use tracing::{debug, info};

use crate::models::invoice::{AggregationStrategy, ParsedInvoice};

use super::aggregate::aggregate;
use super::normalize::normalize;
use super::rules::{
    DentistNameExtractor, FieldExtractor, LineItemExtractor, PatientExtractor,
};
use super::Result;

/// Result of invoice extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted invoice data.
    pub invoice: ParsedInvoice,
    /// Text after ligature normalization.
    pub normalized_text: String,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
pub trait InvoiceParser: Send + Sync {
    /// Parse invoice from text.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Parser built from the dentist, patient and table extractors.
pub struct RuleInvoiceParser {
    strategy: AggregationStrategy,
}

impl RuleInvoiceParser {
    /// Create a parser with the default aggregation strategy.
    pub fn new() -> Self {
        Self {
            strategy: AggregationStrategy::default(),
        }
    }

    /// Set the aggregation strategy.
    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> AggregationStrategy {
        self.strategy
    }
}

impl Default for RuleInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for RuleInvoiceParser {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing invoice from {} characters of text", text.len());
        let normalized = normalize(text);

        let dentist_name = DentistNameExtractor::new().extract(&normalized)?;
        let patient = PatientExtractor::new().extract(&normalized)?;

        let table = LineItemExtractor::new().scan(&normalized);
        for line in &table.skipped {
            warnings.push(format!("Skipped table line: {}", line));
        }

        let invoice = aggregate(
            &dentist_name,
            &patient.patient_name,
            patient.date_due,
            table.items,
            self.strategy,
        )?;

        warnings.extend(invoice.validate());

        debug!(
            "Extracted invoice for {} due {}: total {}",
            invoice.patient_name, invoice.date_due, invoice.total_cost
        );

        Ok(ExtractionResult {
            invoice,
            normalized_text: normalized,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
