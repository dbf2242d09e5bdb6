//! Subcommand implementations.

pub mod config;
pub mod import;
pub mod ledger;
pub mod process;
pub mod report;
pub mod reset;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use labledger_core::models::config::LabConfig;
use labledger_core::models::ledger::MonthLabel;

/// `<config dir>/labledger/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("labledger")
        .join("config.json")
}

/// The file `--config` names, otherwise the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration.
///
/// An explicit `--config` file must exist; the default file is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LabConfig> {
    if let Some(path) = config_path {
        return LabConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        LabConfig::from_file(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
    } else {
        Ok(LabConfig::default())
    }
}

/// Base directory for month folders: the flag, then the config, then
/// `~/Documents/LabLedger`.
pub fn output_dir(config: &LabConfig, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| config.output.base_dir.clone())
        .unwrap_or_else(|| {
            dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("LabLedger")
        })
}

/// Parse a `YYYY-MM` argument.
pub fn parse_month(value: &str) -> anyhow::Result<MonthLabel> {
    MonthLabel::parse(value.trim())
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", value))
}
