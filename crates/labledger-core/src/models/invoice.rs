//! Invoice data models produced by the extraction pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single row of the invoice's line-item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    /// Free text in front of the numeric columns.
    pub description: String,

    /// Quantity column.
    pub quantity: i64,

    /// Unit price column (2dp).
    pub unit_price: Decimal,

    /// Cost column (2dp). Negative for rebates.
    pub cost: Decimal,
}

/// How line items are folded into the invoice total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// `unit_price + extras`, one unit per invoice.
    #[default]
    UnitPlusExtras,

    /// `quantity × (unit_price + extras)`, quantity taken from the first row.
    QuantityTimesSum,
}

/// One invoice document, aggregated into a financial record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    /// Reconstructed name from the "INVOICE FOR:" header.
    pub dentist_name: String,

    /// Patient named in the footer.
    pub patient_name: String,

    /// Payment due date.
    pub date_due: NaiveDate,

    /// Units billed (1 under the default strategy).
    pub total_units: i64,

    /// Unit price of the first line item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,

    /// Sum of costs of every line item after the first.
    pub alloys_extras_cost: Decimal,

    /// Amount billed for the invoice.
    pub total_cost: Decimal,

    /// Rows the totals were computed from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<RawLineItem>,
}

impl ParsedInvoice {
    /// Unit price, or zero when absent.
    pub fn unit_price_or_zero(&self) -> Decimal {
        self.unit_price.unwrap_or(Decimal::ZERO)
    }

    /// Check the accounting invariants and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.patient_name.is_empty() {
            issues.push("Missing patient name".to_string());
        }

        if self.dentist_name.is_empty() {
            issues.push("Missing dentist name".to_string());
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        let expected = Decimal::from(self.total_units)
            * (self.unit_price_or_zero() + self.alloys_extras_cost);
        if expected.round_dp(2) != self.total_cost.round_dp(2) {
            issues.push(format!(
                "Total cost ({}) differs from units x (unit price + extras) ({})",
                self.total_cost, expected
            ));
        }

        issues
    }
}
