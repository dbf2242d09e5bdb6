//! Monthly statement layout.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReportError;
use crate::invoice::normalize;
use crate::invoice::rules::format_usd;
use crate::models::config::LabProfile;
use crate::models::ledger::{checked_total, format_us_date, LedgerRecord, MonthLabel};

use super::Result;

/// Column titles of the statement table.
pub const COLUMNS: [&str; 3] = ["Date Due", "Patient Name", "Total Cost"];

/// One table row, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRow {
    pub date_due: String,
    pub patient_name: String,
    pub total_cost: String,
}

/// Everything printed on a monthly statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub lab_name: String,
    pub lab_address: String,
    pub lab_phone: String,
    pub label: MonthLabel,
    pub period_end: NaiveDate,
    pub dentist_name: Option<String>,
    pub rows: Vec<StatementRow>,
    pub total: Decimal,
    pub payment_due: NaiveDate,
}

impl Statement {
    /// "Statement for period ending 3/31/2024 for DR. SMITH"
    pub fn title(&self) -> String {
        let mut title = format!(
            "Statement for period ending {}",
            format_us_date(self.period_end)
        );
        if let Some(dentist) = &self.dentist_name {
            title.push_str(" for ");
            title.push_str(dentist);
        }
        title
    }

    pub fn contact_line(&self) -> String {
        format!("{} - Phone {}", self.lab_address, self.lab_phone)
    }

    pub fn total_display(&self) -> String {
        format_usd(self.total)
    }

    pub fn questions_line(&self) -> String {
        format!("Questions call {}", self.lab_phone)
    }

    pub fn payment_due_line(&self) -> String {
        format!("Payment due by: {}", format_us_date(self.payment_due))
    }

    /// Render the statement as fixed-width text.
    pub fn to_text(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.patient_name.chars().count())
            .chain(std::iter::once(COLUMNS[1].len()))
            .max()
            .unwrap_or(0);
        let cost_width = self
            .rows
            .iter()
            .map(|r| r.total_cost.len())
            .chain([COLUMNS[2].len(), self.total_display().len()])
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(&format!("{}\n", self.lab_name));
        out.push_str(&format!("{}\n\n", self.contact_line()));
        out.push_str(&format!("{}\n\n", self.title()));
        out.push_str(&format!(
            "{:<10}  {:<name_width$}  {:>cost_width$}\n",
            COLUMNS[0], COLUMNS[1], COLUMNS[2]
        ));
        out.push_str(&format!(
            "{}  {}  {}\n",
            "-".repeat(10),
            "-".repeat(name_width),
            "-".repeat(cost_width)
        ));
        for row in &self.rows {
            out.push_str(&format!(
                "{:<10}  {:<name_width$}  {:>cost_width$}\n",
                row.date_due, row.patient_name, row.total_cost
            ));
        }
        out.push_str(&format!(
            "{:<10}  {:>name_width$}  {:>cost_width$}\n\n",
            "",
            "TOTAL:",
            self.total_display()
        ));
        out.push_str("THANK YOU\n");
        out.push_str(&format!("{}\n", self.questions_line()));
        out.push_str(&format!("{}\n", self.payment_due_line()));
        out
    }
}

/// Builds statements for one lab.
#[derive(Debug, Clone, Default)]
pub struct StatementRenderer {
    lab: LabProfile,
    dentist: Option<String>,
}

impl StatementRenderer {
    pub fn new(lab: LabProfile) -> Self {
        Self { lab, dentist: None }
    }

    /// Set the dentist named in the title.
    pub fn with_dentist(mut self, dentist: Option<String>) -> Self {
        self.dentist = dentist.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn lab(&self) -> &LabProfile {
        &self.lab
    }

    /// Lay out `records` for the `label` period.
    ///
    /// Rows are printed in ascending due-date order regardless of input order,
    /// and every string passes through the ligature normalizer. Fails when the
    /// grand total does not fit in a `Decimal`.
    pub fn build(&self, label: &MonthLabel, records: &[LedgerRecord]) -> Result<Statement> {
        let mut sorted: Vec<&LedgerRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.date_due.cmp(&b.date_due));

        let rows = sorted
            .iter()
            .map(|record| StatementRow {
                date_due: record.date_due.display(),
                patient_name: normalize(&record.patient_name),
                total_cost: format_usd(record.total_cost),
            })
            .collect();
        let total = checked_total(records)
            .ok_or_else(|| ReportError::TotalOutOfRange(label.to_string()))?;

        Ok(Statement {
            lab_name: normalize(&self.lab.name),
            lab_address: normalize(&self.lab.address),
            lab_phone: self.lab.phone.clone(),
            label: label.clone(),
            period_end: label.last_day(),
            dentist_name: self.dentist.as_deref().map(normalize),
            rows,
            total,
            payment_due: label.payment_due(self.lab.payment_day),
        })
    }
}
