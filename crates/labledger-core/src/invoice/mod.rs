//! Invoice text parsing.

pub mod aggregate;
pub mod normalize;
mod parser;
pub mod rules;

pub use aggregate::aggregate;
pub use normalize::normalize;
pub use parser::{ExtractionResult, InvoiceParser, RuleInvoiceParser};

use crate::error::ExtractionError;
use crate::models::invoice::ParsedInvoice;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Parse invoice text with the default rules and aggregation strategy.
pub fn parse(text: &str) -> Result<ParsedInvoice> {
    RuleInvoiceParser::new().parse(text).map(|result| result.invoice)
}
