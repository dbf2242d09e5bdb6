//! Document import: convert, parse, then merge and report per month.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::convert::DocumentConverter;
use crate::error::{LabError, Result};
use crate::invoice::{ExtractionResult, InvoiceParser};
use crate::ledger::{Ledger, LedgerStore, MergeOutcome};
use crate::models::config::{LabConfig, LabProfile};
use crate::models::invoice::ParsedInvoice;
use crate::models::ledger::{bucket_key, LedgerRecord, MonthLabel};
use crate::report::{ReportSink, StatementRenderer};

/// Convert and parse one document.
///
/// A panic inside the converter or parser is caught and reported as
/// [`LabError::Panicked`], so one bad file cannot take down a batch.
pub fn process_document(
    converter: &dyn DocumentConverter,
    parser: &dyn InvoiceParser,
    path: &Path,
) -> Result<ExtractionResult> {
    panic::catch_unwind(AssertUnwindSafe(|| convert_and_parse(converter, parser, path)))
        .unwrap_or_else(|payload| Err(LabError::Panicked(panic_message(payload.as_ref()))))
}

fn convert_and_parse(
    converter: &dyn DocumentConverter,
    parser: &dyn InvoiceParser,
    path: &Path,
) -> Result<ExtractionResult> {
    let text = converter.convert(path)?;
    debug!("{}: {} characters of text", path.display(), text.len());

    let result = parser.parse(&text)?;
    for warning in &result.warnings {
        warn!("{}: {}", path.display(), warning);
    }
    Ok(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A document that could not be imported, kept for manual review.
#[derive(Debug)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub error: LabError,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.error)
    }
}

/// Settings that apply to a whole import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Put every invoice in this bucket instead of its due-date month.
    pub month_override: Option<MonthLabel>,
    /// Dentist printed on statements instead of the extracted one.
    pub dentist_override: Option<String>,
    /// Render and publish statements after merging.
    pub write_report: bool,
}

impl ImportOptions {
    pub fn from_config(config: &LabConfig) -> Result<Self> {
        let month_override = match config.overrides.month.as_deref().map(str::trim) {
            Some(month) if !month.is_empty() => Some(MonthLabel::parse(month)?),
            _ => None,
        };
        let dentist_override = config
            .overrides
            .dentist_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Self {
            month_override,
            dentist_override,
            write_report: config.output.write_report,
        })
    }
}

/// What happened to one month bucket.
#[derive(Debug, Clone)]
pub struct BucketReport {
    pub outcome: MergeOutcome,
    /// Dentist named on the statement.
    pub dentist_name: Option<String>,
    /// Where the statement was published, if one was written.
    pub statement: Option<String>,
}

/// Result of importing a batch of documents.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub documents: usize,
    pub imported: usize,
    pub buckets: Vec<BucketReport>,
    pub failures: Vec<DocumentFailure>,
}

/// Merges parsed invoices into ledgers and publishes statements.
pub struct Importer<S: LedgerStore, R: ReportSink> {
    ledger: Ledger<S>,
    sink: R,
    lab: LabProfile,
    options: ImportOptions,
}

impl<S: LedgerStore, R: ReportSink> Importer<S, R> {
    pub fn new(store: S, sink: R, lab: LabProfile, options: ImportOptions) -> Self {
        Self {
            ledger: Ledger::new(store),
            sink,
            lab,
            options,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Bucket an invoice is filed under.
    pub fn bucket_for(&self, invoice: &ParsedInvoice) -> MonthLabel {
        self.options
            .month_override
            .clone()
            .unwrap_or_else(|| bucket_key(invoice.date_due))
    }

    /// Convert, parse and commit documents one after another.
    ///
    /// Document errors are collected; ledger and report errors stop the import.
    pub fn import(
        &self,
        converter: &dyn DocumentConverter,
        parser: &dyn InvoiceParser,
        paths: &[PathBuf],
    ) -> Result<ImportSummary> {
        let mut invoices = Vec::new();
        let mut failures = Vec::new();

        for path in paths {
            match process_document(converter, parser, path) {
                Ok(result) => invoices.push(result.invoice),
                Err(e) => {
                    error!("Failed to import {}: {}", path.display(), e);
                    failures.push(DocumentFailure {
                        source: path.clone(),
                        error: e,
                    });
                }
            }
        }

        let buckets = self.commit(&invoices)?;
        Ok(ImportSummary {
            documents: paths.len(),
            imported: invoices.len(),
            buckets,
            failures,
        })
    }

    /// Merge invoices into their buckets and publish a statement per bucket.
    pub fn commit(&self, invoices: &[ParsedInvoice]) -> Result<Vec<BucketReport>> {
        let mut groups: BTreeMap<MonthLabel, (Option<String>, Vec<LedgerRecord>)> = BTreeMap::new();
        for invoice in invoices {
            let (dentist, records) = groups.entry(self.bucket_for(invoice)).or_default();
            if dentist.is_none() {
                *dentist = Some(invoice.dentist_name.clone());
            }
            records.push(LedgerRecord::from(invoice));
        }

        let mut reports = Vec::with_capacity(groups.len());
        for (label, (extracted_dentist, records)) in groups {
            let outcome = self.ledger.merge_and_persist(&label, &records)?;
            let dentist_name = self.options.dentist_override.clone().or(extracted_dentist);

            let statement = if self.options.write_report {
                Some(self.publish(&label, &outcome.records, dentist_name.clone())?)
            } else {
                None
            };

            reports.push(BucketReport {
                outcome,
                dentist_name,
                statement,
            });
        }

        info!("Committed {} invoices into {} buckets", invoices.len(), reports.len());
        Ok(reports)
    }

    /// Render the statement for a bucket from its stored ledger.
    pub fn republish(&self, label: &MonthLabel, dentist: Option<String>) -> Result<String> {
        let records = self.ledger.load(label)?;
        let dentist = self.options.dentist_override.clone().or(dentist);
        self.publish(label, &records, dentist)
    }

    /// Delete a bucket's ledger and statement.
    pub fn reset(&self, label: &MonthLabel) -> Result<bool> {
        let statement_removed = self.sink.remove(label)?;
        let ledger_removed = self.ledger.reset(label)?;
        Ok(statement_removed || ledger_removed)
    }

    fn publish(
        &self,
        label: &MonthLabel,
        records: &[LedgerRecord],
        dentist: Option<String>,
    ) -> Result<String> {
        let bytes = StatementRenderer::new(self.lab.clone())
            .with_dentist(dentist)
            .render_pdf(label, records)?;
        self.sink.publish(label, &bytes).map_err(LabError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::PlainTextConverter;
    use crate::error::{ExtractionErrorKind, ReportError};
    use crate::invoice::RuleInvoiceParser;
    use crate::ledger::MemoryLedgerStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    /// Keeps published statements in memory.
    #[derive(Default)]
    struct MemorySink {
        published: Mutex<Vec<(MonthLabel, usize)>>,
    }

    impl ReportSink for MemorySink {
        fn publish(&self, label: &MonthLabel, bytes: &[u8]) -> crate::report::Result<String> {
            self.published.lock().unwrap().push((label.clone(), bytes.len()));
            Ok(format!("memory:{}", label))
        }

        fn remove(&self, _label: &MonthLabel) -> crate::report::Result<bool> {
            Ok(false)
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn publish(&self, _label: &MonthLabel, _bytes: &[u8]) -> crate::report::Result<String> {
            Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn remove(&self, _label: &MonthLabel) -> crate::report::Result<bool> {
            Ok(false)
        }
    }

    fn invoice(dentist: &str, patient: &str, month: u32, day: u32, cents: i64) -> ParsedInvoice {
        ParsedInvoice {
            dentist_name: dentist.to_string(),
            patient_name: patient.to_string(),
            date_due: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
            total_units: 1,
            unit_price: Some(Decimal::new(cents, 2)),
            alloys_extras_cost: Decimal::ZERO,
            total_cost: Decimal::new(cents, 2),
            line_items: Vec::new(),
        }
    }

    fn options(write_report: bool) -> ImportOptions {
        ImportOptions {
            write_report,
            ..Default::default()
        }
    }

    #[test]
    fn test_commit_groups_by_month() {
        let importer = Importer::new(
            MemoryLedgerStore::new(),
            MemorySink::default(),
            LabProfile::default(),
            options(true),
        );
        let reports = importer
            .commit(&[
                invoice("DR. A", "Jane", 3, 15, 18000),
                invoice("DR. B", "Bob", 4, 2, 5000),
                invoice("DR. C", "Ann", 3, 1, 7500),
            ])
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome.label.to_string(), "2024-03");
        assert_eq!(reports[0].outcome.records.len(), 2);
        assert_eq!(reports[0].dentist_name.as_deref(), Some("DR. A"));
        assert_eq!(reports[1].dentist_name.as_deref(), Some("DR. B"));
        assert_eq!(importer.sink().published.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_overrides() {
        let importer = Importer::new(
            MemoryLedgerStore::new(),
            MemorySink::default(),
            LabProfile::default(),
            ImportOptions {
                month_override: Some(MonthLabel::parse("2024-05").unwrap()),
                dentist_override: Some("DR. OVERRIDE".to_string()),
                write_report: false,
            },
        );
        let reports = importer
            .commit(&[
                invoice("DR. A", "Jane", 3, 15, 18000),
                invoice("DR. A", "Bob", 4, 2, 5000),
            ])
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome.label.to_string(), "2024-05");
        assert_eq!(reports[0].dentist_name.as_deref(), Some("DR. OVERRIDE"));
        assert!(reports[0].statement.is_none());
    }

    #[test]
    fn test_reimport_does_not_duplicate() {
        let importer = Importer::new(
            MemoryLedgerStore::new(),
            MemorySink::default(),
            LabProfile::default(),
            options(false),
        );
        let batch = [invoice("DR. A", "Jane", 3, 15, 18000)];
        importer.commit(&batch).unwrap();
        let reports = importer.commit(&batch).unwrap();

        assert_eq!(reports[0].outcome.records.len(), 1);
        assert_eq!(reports[0].outcome.updated, 1);
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let importer = Importer::new(
            MemoryLedgerStore::new(),
            FailingSink,
            LabProfile::default(),
            options(true),
        );
        let err = importer
            .commit(&[invoice("DR. A", "Jane", 3, 15, 18000)])
            .unwrap_err();
        assert!(!err.is_document_error());
    }

    #[test]
    fn test_import_collects_document_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        let missing = dir.path().join("missing.txt");
        std::fs::write(
            &good,
            "INVOICE FOR: DR. SMITH\nDESCRIPTION QUANTITY UNIT PRICE COST\n\
             Crown 1 $200.00 $200.00\nTotal\nPatient: Jane Doe, Due 3/15/2024\n",
        )
        .unwrap();
        std::fs::write(&bad, "INVOICE FOR: DR. SMITH DESCRIPTION\nno footer\n").unwrap();

        let importer = Importer::new(
            MemoryLedgerStore::new(),
            MemorySink::default(),
            LabProfile::default(),
            options(true),
        );
        let summary = importer
            .import(
                &PlainTextConverter::new(),
                &RuleInvoiceParser::new(),
                &[good, bad.clone(), missing.clone()],
            )
            .unwrap();

        assert_eq!(summary.documents, 3);
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.buckets.len(), 1);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].source, bad);
        assert!(matches!(
            &summary.failures[0].error,
            LabError::Extraction(e) if e.kind() == ExtractionErrorKind::PatientOrDateNotFound
        ));
        assert_eq!(summary.failures[1].source, missing);
        assert!(summary.failures.iter().all(|f| f.error.is_document_error()));
    }

    /// Panics on `boom.txt`, reads everything else as plain text.
    struct PanickingConverter(PlainTextConverter);

    impl DocumentConverter for PanickingConverter {
        fn supports(&self, path: &std::path::Path) -> bool {
            self.0.supports(path)
        }

        fn convert(&self, path: &std::path::Path) -> crate::convert::Result<String> {
            if path.ends_with("boom.txt") {
                panic!("decoder blew up");
            }
            self.0.convert(path)
        }
    }

    #[test]
    fn test_import_survives_converter_panic() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let boom = dir.path().join("boom.txt");
        std::fs::write(
            &good,
            "INVOICE FOR: DR. SMITH\nDESCRIPTION QUANTITY UNIT PRICE COST\n\
             Crown 1 $200.00 $200.00\nTotal\nPatient: Jane Doe, Due 3/15/2024\n",
        )
        .unwrap();
        std::fs::write(&boom, "anything").unwrap();

        let importer = Importer::new(
            MemoryLedgerStore::new(),
            MemorySink::default(),
            LabProfile::default(),
            options(false),
        );
        let summary = importer
            .import(
                &PanickingConverter(PlainTextConverter::new()),
                &RuleInvoiceParser::new(),
                &[boom.clone(), good],
            )
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].source, boom);
        assert!(matches!(
            &summary.failures[0].error,
            LabError::Panicked(message) if message == "decoder blew up"
        ));
        assert!(summary.failures[0].error.is_document_error());
        assert_eq!(
            importer.ledger().load(&MonthLabel::parse("2024-03").unwrap()).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_options_from_config() {
        let mut config = LabConfig::default();
        config.overrides.month = Some("2024-07".to_string());
        config.overrides.dentist_name = Some("  ".to_string());
        let options = ImportOptions::from_config(&config).unwrap();
        assert_eq!(options.month_override, MonthLabel::parse("2024-07").ok());
        assert!(options.dentist_override.is_none());

        config.overrides.month = Some("July".to_string());
        assert!(ImportOptions::from_config(&config).is_err());
    }
}
