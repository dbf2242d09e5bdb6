//! Patient name and due date from the invoice footer.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{ExtractionError, ExtractionErrorKind};

use super::patterns::PATIENT_DUE;
use super::{ExtractionMatch, FieldExtractor, Result};

/// Patient name and due date pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDue {
    pub patient_name: String,
    pub date_due: NaiveDate,
}

/// Extracts `Patient: <name>, Due <m>/<d>/<yyyy>`.
///
/// Only the first occurrence counts. The date is read strictly as US
/// month/day/year; an impossible calendar date is an error, not a rollover.
pub struct PatientExtractor;

impl PatientExtractor {
    pub fn new() -> Self {
        Self
    }

    fn find(&self, text: &str) -> Result<ExtractionMatch<PatientDue>> {
        let caps = PATIENT_DUE.captures(text).ok_or_else(|| {
            ExtractionError::new(
                ExtractionErrorKind::PatientOrDateNotFound,
                "no 'Patient: <name>, Due <m>/<d>/<yyyy>' line",
            )
        })?;

        let full = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let patient_name = caps["name"].trim().to_string();
        if patient_name.is_empty() {
            return Err(ExtractionError::new(
                ExtractionErrorKind::PatientOrDateNotFound,
                "patient name is empty",
            ));
        }

        let raw_date = format!("{}/{}/{}", &caps["month"], &caps["day"], &caps["year"]);
        let date_due = parse_components(&caps["year"], &caps["month"], &caps["day"])
            .ok_or_else(|| {
                ExtractionError::new(
                    ExtractionErrorKind::InvalidDate,
                    format!("'{}' is not a calendar date", raw_date),
                )
            })?;

        let (start, end, source) = full.unwrap_or((0, 0, ""));
        Ok(ExtractionMatch::new(
            PatientDue {
                patient_name,
                date_due,
            },
            source,
        )
        .with_position(start, end))
    }
}

impl Default for PatientExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PatientExtractor {
    type Output = PatientDue;

    fn extract(&self, text: &str) -> Result<Self::Output> {
        let found = self.find(text)?;
        debug!(
            "Found patient {:?} due {} at {:?}",
            found.value.patient_name, found.value.date_due, found.position
        );
        Ok(found.value)
    }
}

fn parse_components(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
