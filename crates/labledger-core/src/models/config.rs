//! Configuration structures for the import pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::invoice::AggregationStrategy;

/// Main configuration for the labledger pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Where ledgers and statements are written.
    pub output: OutputConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Lab details printed on every statement.
    pub lab: LabProfile,

    /// Values that replace what the documents say.
    pub overrides: OverrideConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory holding one folder per month (default: ~/Documents/LabLedger).
    pub base_dir: Option<PathBuf>,

    /// Render and publish a statement after every import.
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            write_report: true,
        }
    }
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How line items are folded into the invoice total.
    pub aggregation: AggregationStrategy,

    /// Try the PDF's native text layer before the fallback extractor.
    pub prefer_native_text: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationStrategy::UnitPlusExtras,
            prefer_native_text: true,
        }
    }
}

/// Lab letterhead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabProfile {
    pub name: String,
    pub address: String,
    pub phone: String,

    /// Day of the following month payment is due.
    pub payment_day: u32,
}

impl Default for LabProfile {
    fn default() -> Self {
        Self {
            name: "Accudent Dental Lab".to_string(),
            address: "5283 West 8180 South, West Jordan, Utah".to_string(),
            phone: "801-231-6161".to_string(),
            payment_day: 25,
        }
    }
}

/// Manual overrides (empty = auto-detect).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Force every imported invoice into this `YYYY-MM` bucket.
    pub month: Option<String>,

    /// Dentist name printed on statements instead of the extracted one.
    pub dentist_name: Option<String>,
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Documents converted and parsed concurrently.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

impl LabConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
