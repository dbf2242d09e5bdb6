//! Core library for dental-lab invoice ledgers.
//!
//! This crate provides:
//! - Document to text conversion (PDF text layers, plain text)
//! - Rule-based invoice extraction (dentist, patient and due date, line items)
//! - Monthly ledgers with natural-key merging and per-month locking
//! - Monthly statements rendered as PDF

pub mod convert;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod report;

pub use convert::{DefaultConverter, DocumentConverter, PdfTextConverter, PlainTextConverter};
pub use error::{
    ConversionError, ExtractionError, ExtractionErrorKind, LabError, LedgerError, ReportError,
    Result,
};
pub use invoice::{parse, ExtractionResult, InvoiceParser, RuleInvoiceParser};
pub use ledger::{CsvLedgerStore, Ledger, LedgerStore, MemoryLedgerStore, MergeOutcome};
pub use models::config::LabConfig;
pub use models::invoice::{AggregationStrategy, ParsedInvoice, RawLineItem};
pub use models::ledger::{bucket_key, checked_total, DueDate, LedgerRecord, MonthLabel};
pub use pipeline::{process_document, DocumentFailure, ImportOptions, ImportSummary, Importer};
pub use report::{render_statement, FileReportSink, ReportSink, Statement, StatementRenderer};
