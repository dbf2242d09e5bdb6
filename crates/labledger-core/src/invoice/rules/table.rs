//! Line-item table extraction.

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, trace};

use crate::models::invoice::RawLineItem;

use super::amounts::scan_amounts;
use super::patterns::{TABLE_END, TABLE_HEADER_TOKENS};
use super::{FieldExtractor, Result};

/// Outcome of scanning the line-item table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableScan {
    /// Parsed rows in document order.
    pub items: Vec<RawLineItem>,
    /// Lines inside the table that did not parse as a row.
    pub skipped: Vec<String>,
    /// Zero-based line index of the header, if one was found.
    pub header_line: Option<usize>,
}

/// Line-item table extractor.
///
/// A missing header is not an error here: it yields an empty item list and the
/// aggregator decides what an empty table means.
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scan the table, keeping skipped lines for diagnostics.
    pub fn scan(&self, text: &str) -> TableScan {
        let lines: Vec<&str> = text.lines().collect();
        let Some(header_idx) = find_header(&lines) else {
            debug!("No line-item table header found");
            return TableScan::default();
        };

        let mut scan = TableScan {
            header_line: Some(header_idx),
            ..Default::default()
        };

        for line in &lines[header_idx + 1..] {
            let line = line.trim();
            if line.is_empty() || TABLE_END.is_match(line) {
                break;
            }

            match parse_row(line) {
                Some(item) => {
                    trace!("Row {:?}", item);
                    scan.items.push(item);
                }
                None => scan.skipped.push(line.to_string()),
            }
        }

        debug!(
            "Table at line {}: {} rows, {} skipped",
            header_idx,
            scan.items.len(),
            scan.skipped.len()
        );
        scan
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LineItemExtractor {
    type Output = Vec<RawLineItem>;

    fn extract(&self, text: &str) -> Result<Self::Output> {
        Ok(self.scan(text).items)
    }
}

/// Index of the first line that looks like the table header.
pub fn find_header(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| is_header(line))
}

fn is_header(line: &str) -> bool {
    let compact: String = line
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    TABLE_HEADER_TOKENS
        .iter()
        .all(|token| compact.contains(token))
}

/// Parse one table row from its last three numeric tokens.
///
/// Returns `None` for lines with fewer than three tokens. Leading numbers are
/// left in the description, since descriptions often carry tooth numbers or
/// shade codes.
pub fn parse_row(line: &str) -> Option<RawLineItem> {
    let tokens = scan_amounts(line);
    if tokens.len() < 3 {
        return None;
    }

    let [quantity, unit_price, cost] = &tokens[tokens.len() - 3..] else {
        return None;
    };

    let description = line[..quantity.start()]
        .trim_matches(|c: char| c == '|' || c == '\t' || c == ' ')
        .to_string();

    Some(RawLineItem {
        description,
        quantity: quantity.value.trunc().to_i64()?,
        unit_price: unit_price.value,
        cost: cost.value,
    })
}
