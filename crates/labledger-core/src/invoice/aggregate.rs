//! Folding line items into one invoice record.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ExtractionError, ExtractionErrorKind};
use crate::models::invoice::{AggregationStrategy, ParsedInvoice, RawLineItem};

use super::Result;

/// Build a [`ParsedInvoice`] from extracted fields.
///
/// The first line item carries the unit price; every later item's cost is
/// summed into alloys/extras, rebates included.
pub fn aggregate(
    dentist_name: &str,
    patient_name: &str,
    date_due: NaiveDate,
    line_items: Vec<RawLineItem>,
    strategy: AggregationStrategy,
) -> Result<ParsedInvoice> {
    let Some(first) = line_items.first() else {
        return Err(ExtractionError::new(
            ExtractionErrorKind::NoLineItems,
            "the line-item table has no rows",
        ));
    };

    let out_of_range = || {
        ExtractionError::new(
            ExtractionErrorKind::AmountOutOfRange,
            "line-item amounts overflow the invoice total",
        )
    };

    let unit_price = first.unit_price;
    let alloys_extras_cost = line_items
        .iter()
        .skip(1)
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.cost))
        .ok_or_else(out_of_range)?;
    let unit_total = unit_price
        .checked_add(alloys_extras_cost)
        .ok_or_else(out_of_range)?;

    let (total_units, total_cost) = match strategy {
        AggregationStrategy::UnitPlusExtras => (1, unit_total),
        AggregationStrategy::QuantityTimesSum => {
            let units = first.quantity;
            let total = unit_total
                .checked_mul(Decimal::from(units))
                .ok_or_else(out_of_range)?;
            (units, total)
        }
    };

    Ok(ParsedInvoice {
        dentist_name: dentist_name.to_string(),
        patient_name: patient_name.to_string(),
        date_due,
        total_units,
        unit_price: Some(unit_price),
        alloys_extras_cost,
        total_cost,
        line_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(quantity: i64, unit_price: &str, cost: &str) -> RawLineItem {
        RawLineItem {
            description: "Item".to_string(),
            quantity,
            unit_price: dec(unit_price),
            cost: dec(cost),
        }
    }

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_single_item() {
        let invoice = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![item(1, "200.00", "200.00")],
            AggregationStrategy::UnitPlusExtras,
        )
        .unwrap();
        assert_eq!(invoice.unit_price, Some(dec("200.00")));
        assert_eq!(invoice.alloys_extras_cost, Decimal::ZERO);
        assert_eq!(invoice.total_cost, dec("200.00"));
        assert_eq!(invoice.total_units, 1);
    }

    #[test]
    fn test_extras_and_rebate() {
        let invoice = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![
                item(1, "200.00", "200.00"),
                item(2, "15.00", "30.00"),
                item(1, "20.00", "-20.00"),
            ],
            AggregationStrategy::UnitPlusExtras,
        )
        .unwrap();
        assert_eq!(invoice.alloys_extras_cost, dec("10.00"));
        assert_eq!(invoice.total_cost, dec("210.00"));
        assert!(invoice.validate().is_empty());
    }

    #[test]
    fn test_first_row_quantity_ignored_by_default() {
        let invoice = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![item(3, "100.00", "300.00")],
            AggregationStrategy::UnitPlusExtras,
        )
        .unwrap();
        assert_eq!(invoice.total_cost, dec("100.00"));
    }

    #[test]
    fn test_quantity_times_sum() {
        let invoice = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![item(3, "100.00", "300.00"), item(1, "10.00", "10.00")],
            AggregationStrategy::QuantityTimesSum,
        )
        .unwrap();
        assert_eq!(invoice.total_units, 3);
        assert_eq!(invoice.total_cost, dec("330.00"));
        assert!(invoice.validate().is_empty());
    }

    #[test]
    fn test_strategies_agree_for_single_unit() {
        let items = vec![item(1, "200.00", "200.00"), item(1, "20.00", "-20.00")];
        let a = aggregate("D", "P", due(), items.clone(), AggregationStrategy::UnitPlusExtras)
            .unwrap();
        let b = aggregate("D", "P", due(), items, AggregationStrategy::QuantityTimesSum).unwrap();
        assert_eq!(a.total_cost, b.total_cost);
    }

    #[test]
    fn test_empty_items_fail() {
        let err = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            Vec::new(),
            AggregationStrategy::UnitPlusExtras,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::NoLineItems);
    }

    #[test]
    fn test_overflowing_extras_fail() {
        let err = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![
                item(1, "200.00", "200.00"),
                item(1, "79228162514264337593543950335", "79228162514264337593543950335"),
                item(1, "79228162514264337593543950335", "79228162514264337593543950335"),
            ],
            AggregationStrategy::UnitPlusExtras,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::AmountOutOfRange);
    }

    #[test]
    fn test_overflowing_quantity_fails() {
        let err = aggregate(
            "DR. SMITH",
            "Jane Doe",
            due(),
            vec![item(2, "79228162514264337593543950335", "0")],
            AggregationStrategy::QuantityTimesSum,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::AmountOutOfRange);
    }
}
