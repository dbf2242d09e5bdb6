//! Ledger records, month buckets and the legacy ledger layout.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::models::invoice::ParsedInvoice;

/// Due date as stored in a ledger row.
///
/// Cells that do not parse as a calendar date are kept verbatim so a
/// damaged ledger still round-trips; they sort after every real date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DueDate {
    Date(NaiveDate),
    Unparsed(String),
}

impl DueDate {
    /// Parse a ledger cell: `m/d/yyyy` or ISO `yyyy-mm-dd`.
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        parse_us_date(cell)
            .or_else(|| NaiveDate::parse_from_str(cell, "%Y-%m-%d").ok())
            .map(DueDate::Date)
            .unwrap_or_else(|| DueDate::Unparsed(cell.to_string()))
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DueDate::Date(date) => Some(*date),
            DueDate::Unparsed(_) => None,
        }
    }

    /// Text used in the natural key: ISO date or the raw cell.
    pub fn key(&self) -> String {
        match self {
            DueDate::Date(date) => date.format("%Y-%m-%d").to_string(),
            DueDate::Unparsed(raw) => raw.clone(),
        }
    }

    /// Display form, `m/d/yyyy`.
    pub fn display(&self) -> String {
        match self {
            DueDate::Date(date) => format_us_date(*date),
            DueDate::Unparsed(raw) => raw.clone(),
        }
    }
}

impl From<NaiveDate> for DueDate {
    fn from(date: NaiveDate) -> Self {
        DueDate::Date(date)
    }
}

impl Ord for DueDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DueDate::Date(a), DueDate::Date(b)) => a.cmp(b),
            (DueDate::Date(_), DueDate::Unparsed(_)) => Ordering::Less,
            (DueDate::Unparsed(_), DueDate::Date(_)) => Ordering::Greater,
            (DueDate::Unparsed(_), DueDate::Unparsed(_)) => Ordering::Equal,
        }
    }
}

impl PartialOrd for DueDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The persisted, mergeable unit of a monthly ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date_due: DueDate,
    pub patient_name: String,
    pub total_cost: Decimal,
}

/// Deduplication key of a ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    date_due: String,
    patient_name: String,
    total_cost: Decimal,
}

impl LedgerRecord {
    pub fn new(date_due: impl Into<DueDate>, patient_name: impl Into<String>, total_cost: Decimal) -> Self {
        Self {
            date_due: date_due.into(),
            patient_name: patient_name.into(),
            total_cost,
        }
    }

    /// `(date, patient, total)` with exact decimal value equality.
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date_due: self.date_due.key(),
            patient_name: self.patient_name.clone(),
            // 180.0 and 180.00 are the same amount; normalize so they hash alike.
            total_cost: self.total_cost.normalize(),
        }
    }
}

impl From<&ParsedInvoice> for LedgerRecord {
    fn from(invoice: &ParsedInvoice) -> Self {
        LedgerRecord::new(
            invoice.date_due,
            invoice.patient_name.clone(),
            invoice.total_cost,
        )
    }
}

/// A `YYYY-MM` month bucket identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    /// Bucket a due date belongs to.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `YYYY-MM` label.
    pub fn parse(label: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidMonth(label.to_string());
        let (year, month) = label.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Last calendar day of the month; the statement period end.
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// `day` of the following month, clamped to that month's length.
    pub fn payment_due(&self, day: u32) -> NaiveDate {
        let next = self.next();
        let day = day.clamp(1, next.last_day().day());
        NaiveDate::from_ymd_opt(next.year, next.month, day).unwrap_or_else(|| next.first_day())
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for MonthLabel {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MonthLabel::parse(&value)
    }
}

impl From<MonthLabel> for String {
    fn from(label: MonthLabel) -> Self {
        label.to_string()
    }
}

/// Derive the bucket label (`YYYY-MM`) for a due date.
pub fn bucket_key(date_due: NaiveDate) -> MonthLabel {
    MonthLabel::from_date(date_due)
}

/// A row of the retired six-column ledger layout.
///
/// The old spreadsheet carried a hidden helper column computed by a live
/// formula; here the product is recomputed on demand instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyLedgerRow {
    pub date_due: DueDate,
    pub patient_name: String,
    pub total_units: i64,
    pub unit_price: Option<Decimal>,
    pub alloys_extras_cost: Decimal,
    pub total_cost: Option<Decimal>,
}

impl LegacyLedgerRow {
    /// `units × (unit_price + extras)`; `None` on overflow.
    pub fn derived_total(&self) -> Option<Decimal> {
        self.unit_price
            .unwrap_or(Decimal::ZERO)
            .checked_add(self.alloys_extras_cost)?
            .checked_mul(Decimal::from(self.total_units))
    }

    /// Convert to the current three-field record.
    ///
    /// `None` when the total is blank and cannot be recomputed.
    pub fn into_record(self) -> Option<LedgerRecord> {
        let total_cost = match self.total_cost {
            Some(total) => total,
            None => self.derived_total()?,
        };
        Some(LedgerRecord {
            date_due: self.date_due,
            patient_name: self.patient_name,
            total_cost,
        })
    }
}

/// Parse `m/d/yyyy` with strict month-first ordering.
pub fn parse_us_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year_text = parts.next()?;
    if parts.next().is_some() || year_text.len() != 4 {
        return None;
    }
    let year: i32 = year_text.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format as `m/d/yyyy` without zero padding.
pub fn format_us_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Sum of `total_cost` over `records`, or `None` if it overflows.
pub fn checked_total<'a>(records: impl IntoIterator<Item = &'a LedgerRecord>) -> Option<Decimal> {
    records
        .into_iter()
        .try_fold(Decimal::ZERO, |total, record| total.checked_add(record.total_cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bucket_key() {
        assert_eq!(bucket_key(date(2024, 3, 15)).to_string(), "2024-03");
        assert_eq!(bucket_key(date(2023, 12, 1)).to_string(), "2023-12");
    }

    #[test]
    fn test_month_label_parse() {
        let label = MonthLabel::parse("2024-02").unwrap();
        assert_eq!(label.year(), 2024);
        assert_eq!(label.month(), 2);
        assert!(MonthLabel::parse("2024-13").is_err());
        assert!(MonthLabel::parse("2024-2").is_err());
        assert!(MonthLabel::parse("March").is_err());
    }

    #[test]
    fn test_period_end_and_payment_due() {
        let feb = MonthLabel::parse("2024-02").unwrap();
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.payment_due(25), date(2024, 3, 25));

        let dec = MonthLabel::parse("2023-12").unwrap();
        assert_eq!(dec.last_day(), date(2023, 12, 31));
        assert_eq!(dec.payment_due(25), date(2024, 1, 25));

        let jan = MonthLabel::parse("2023-01").unwrap();
        assert_eq!(jan.payment_due(31), date(2023, 2, 28));
    }

    #[test]
    fn test_due_date_parse() {
        assert_eq!(DueDate::parse("3/5/2024"), DueDate::Date(date(2024, 3, 5)));
        assert_eq!(DueDate::parse("2024-03-05"), DueDate::Date(date(2024, 3, 5)));
        assert_eq!(DueDate::parse("2/30/2024"), DueDate::Unparsed("2/30/2024".to_string()));
    }

    #[test]
    fn test_unparsed_dates_sort_last() {
        let mut dates = vec![
            DueDate::Unparsed("soon".to_string()),
            DueDate::Date(date(2024, 3, 10)),
            DueDate::Date(date(2024, 3, 1)),
        ];
        dates.sort();
        assert_eq!(dates[0], DueDate::Date(date(2024, 3, 1)));
        assert_eq!(dates[2], DueDate::Unparsed("soon".to_string()));
    }

    #[test]
    fn test_natural_key_ignores_decimal_scale() {
        let a = LedgerRecord::new(date(2024, 3, 15), "Jane Doe", Decimal::from_str("180.0").unwrap());
        let b = LedgerRecord::new(date(2024, 3, 15), "Jane Doe", Decimal::from_str("180.00").unwrap());
        assert_eq!(a.natural_key(), b.natural_key());

        let c = LedgerRecord::new(date(2024, 3, 15), "Jane Doe", Decimal::from_str("180.01").unwrap());
        assert_ne!(a.natural_key(), c.natural_key());
    }

    #[test]
    fn test_legacy_row_recomputes_missing_total() {
        let row = LegacyLedgerRow {
            date_due: DueDate::Date(date(2024, 3, 15)),
            patient_name: "Jane Doe".to_string(),
            total_units: 1,
            unit_price: Some(Decimal::new(20000, 2)),
            alloys_extras_cost: Decimal::new(-2000, 2),
            total_cost: None,
        };
        assert_eq!(row.derived_total(), Some(Decimal::new(18000, 2)));
        assert_eq!(row.into_record().unwrap().total_cost, Decimal::new(18000, 2));
    }

    #[test]
    fn test_format_us_date() {
        assert_eq!(format_us_date(date(2024, 3, 5)), "3/5/2024");
        assert_eq!(parse_us_date("03/05/2024"), Some(date(2024, 3, 5)));
        assert_eq!(parse_us_date("3/5/24"), None);
    }
}
