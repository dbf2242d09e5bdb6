//! CSV-backed ledger store, one file per month bucket.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::invoice::normalize;
use crate::invoice::rules::{format_usd, parse_us_amount};
use crate::models::ledger::{DueDate, LedgerRecord, LegacyLedgerRow, MonthLabel};

use super::{LedgerStore, Result};

/// Columns written by this store.
pub const CURRENT_HEADERS: [&str; 3] = ["Date Due", "Patient Name", "Total Cost"];

/// Columns of the retired six-column layout (read-only).
pub const LEGACY_HEADERS: [&str; 6] = [
    "Date Due",
    "Patient Name",
    "Total Units",
    "Unit Price",
    "Alloys/Extras Cost",
    "Total Cost",
];

/// Stores each bucket as `<base>/<label>/<label>_Ledger.csv`.
#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    base_dir: PathBuf,
}

impl CsvLedgerStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Folder holding a bucket's ledger and statement.
    pub fn bucket_dir(&self, label: &MonthLabel) -> PathBuf {
        self.base_dir.join(label.to_string())
    }

    pub fn ledger_path(&self, label: &MonthLabel) -> PathBuf {
        self.bucket_dir(label).join(format!("{}_Ledger.csv", label))
    }

    /// Read a ledger file in either the current or the legacy layout.
    pub fn read_file(path: &Path) -> Result<Vec<LedgerRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let layout = Layout::detect(&headers).ok_or_else(|| LedgerError::UnknownSchema {
            path: path.to_path_buf(),
            header: headers.iter().collect::<Vec<_>>().join(","),
        })?;
        debug!("Reading {} as {:?} layout", path.display(), layout);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if row.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            records.push(layout.decode(&row, line)?);
        }

        Ok(records)
    }

    /// Write records in the current three-column layout.
    pub fn write_file(path: &Path, records: &[LedgerRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CURRENT_HEADERS)?;
        for record in records {
            writer.write_record([
                record.date_due.display(),
                normalize(&record.patient_name),
                format_usd(record.total_cost),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self, label: &MonthLabel) -> Result<Vec<LedgerRecord>> {
        let path = self.ledger_path(label);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_file(&path)
    }

    fn save(&self, label: &MonthLabel, records: &[LedgerRecord]) -> Result<()> {
        let dir = self.bucket_dir(label);
        fs::create_dir_all(&dir)?;

        // Write next to the target and rename so a crash never leaves a
        // half-written ledger behind.
        let path = self.ledger_path(label);
        let tmp = path.with_extension("csv.tmp");
        Self::write_file(&tmp, records)?;
        fs::rename(&tmp, &path)?;

        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn remove(&self, label: &MonthLabel) -> Result<bool> {
        let path = self.ledger_path(label);
        match fs::remove_file(&path) {
            Ok(()) => {
                // Drop the bucket folder too once nothing else lives there.
                let dir = self.bucket_dir(label);
                if fs::read_dir(&dir).map(|mut d| d.next().is_none()).unwrap_or(false) {
                    if let Err(e) = fs::remove_dir(&dir) {
                        warn!("Could not remove {}: {}", dir.display(), e);
                    }
                }
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self, label: &MonthLabel) -> String {
        self.ledger_path(label).display().to_string()
    }
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy)]
enum Layout {
    Current {
        date: usize,
        patient: usize,
        total: usize,
    },
    Legacy {
        date: usize,
        patient: usize,
        units: usize,
        price: usize,
        extras: usize,
        total: Option<usize>,
    },
}

impl Layout {
    fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| {
            let wanted = fold_header(name);
            headers.iter().position(|h| fold_header(h) == wanted)
        };

        let date = find(CURRENT_HEADERS[0])?;
        let patient = find(CURRENT_HEADERS[1])?;
        let total = find(CURRENT_HEADERS[2]);

        match (
            find(LEGACY_HEADERS[2]),
            find(LEGACY_HEADERS[3]),
            find(LEGACY_HEADERS[4]),
        ) {
            (Some(units), Some(price), Some(extras)) => Some(Layout::Legacy {
                date,
                patient,
                units,
                price,
                extras,
                total,
            }),
            _ => total.map(|total| Layout::Current {
                date,
                patient,
                total,
            }),
        }
    }

    fn decode(&self, row: &csv::StringRecord, line: u64) -> Result<LedgerRecord> {
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let malformed = |reason: String| LedgerError::MalformedRow { line, reason };

        match *self {
            Layout::Current {
                date,
                patient,
                total,
            } => {
                let total_cost = parse_us_amount(cell(total))
                    .ok_or_else(|| malformed(format!("bad total cost '{}'", cell(total))))?;
                Ok(LedgerRecord::new(
                    DueDate::parse(cell(date)),
                    cell(patient),
                    total_cost,
                ))
            }
            Layout::Legacy {
                date,
                patient,
                units,
                price,
                extras,
                total,
            } => {
                let total_units = match cell(units) {
                    "" => 1,
                    raw => raw
                        .parse::<i64>()
                        .map_err(|_| malformed(format!("bad total units '{}'", raw)))?,
                };
                let unit_price = optional_amount(cell(price))
                    .map_err(|raw| malformed(format!("bad unit price '{}'", raw)))?;
                let alloys_extras_cost = optional_amount(cell(extras))
                    .map_err(|raw| malformed(format!("bad alloys/extras cost '{}'", raw)))?
                    .unwrap_or(Decimal::ZERO);
                let total_cost = match total {
                    Some(idx) => optional_amount(cell(idx))
                        .map_err(|raw| malformed(format!("bad total cost '{}'", raw)))?,
                    None => None,
                };

                Ok(LegacyLedgerRow {
                    date_due: DueDate::parse(cell(date)),
                    patient_name: cell(patient).to_string(),
                    total_units,
                    unit_price,
                    alloys_extras_cost,
                    total_cost,
                }
                .into_record()
                .ok_or_else(|| malformed("total cost is out of range".to_string()))?)
            }
        }
    }
}

/// Blank cell → `None`; unparseable cell → `Err(raw)`.
fn optional_amount(raw: &str) -> std::result::Result<Option<Decimal>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_us_amount(raw).map(Some).ok_or_else(|| raw.to_string())
}

fn fold_header(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
