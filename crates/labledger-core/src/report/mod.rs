//! Monthly statement rendering and publishing.

mod pdf;
mod statement;

pub use pdf::write_pdf;
pub use statement::{Statement, StatementRenderer, StatementRow, COLUMNS};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ReportError;
use crate::models::ledger::{LedgerRecord, MonthLabel};

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

impl StatementRenderer {
    /// Build and write the statement PDF in one step.
    pub fn render_pdf(&self, label: &MonthLabel, records: &[LedgerRecord]) -> Result<Vec<u8>> {
        write_pdf(&self.build(label, records)?)
    }
}

/// Render a statement with the default lab profile and no dentist line.
pub fn render_statement(label: &MonthLabel, records: &[LedgerRecord]) -> Result<Vec<u8>> {
    StatementRenderer::default().render_pdf(label, records)
}

/// Destination for rendered statements.
pub trait ReportSink: Send + Sync {
    /// Store the statement for `label`, returning where it went.
    fn publish(&self, label: &MonthLabel, bytes: &[u8]) -> Result<String>;

    /// Delete the statement for `label`. Returns whether anything was removed.
    fn remove(&self, label: &MonthLabel) -> Result<bool>;
}

/// Writes `<base>/<label>/<label>_Statement.pdf`.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    base_dir: PathBuf,
}

impl FileReportSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn statement_path(&self, label: &MonthLabel) -> PathBuf {
        self.base_dir
            .join(label.to_string())
            .join(format!("{}_Statement.pdf", label))
    }
}

impl ReportSink for FileReportSink {
    fn publish(&self, label: &MonthLabel, bytes: &[u8]) -> Result<String> {
        let path = self.statement_path(label);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;

        info!("Wrote statement {} ({} bytes)", path.display(), bytes.len());
        Ok(path.display().to_string())
    }

    fn remove(&self, label: &MonthLabel) -> Result<bool> {
        match fs::remove_file(self.statement_path(label)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
