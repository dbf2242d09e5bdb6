//! Reset command - delete a month's ledger and statement.

use std::path::PathBuf;

use clap::Args;
use console::style;

use labledger_core::{CsvLedgerStore, FileReportSink, ImportOptions, Importer};

use super::{load_config, output_dir, parse_month};

/// Arguments for the reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Month to delete (YYYY-MM)
    month: String,

    /// Base directory holding the month folders
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Confirm the deletion
    #[arg(long)]
    yes: bool,
}

pub async fn run(args: ResetArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let label = parse_month(&args.month)?;
    let base_dir = output_dir(&config, args.output_dir);

    if !args.yes {
        anyhow::bail!(
            "Refusing to delete {} under {} without --yes",
            label,
            base_dir.display()
        );
    }

    let importer = Importer::new(
        CsvLedgerStore::new(&base_dir),
        FileReportSink::new(&base_dir),
        config.lab,
        ImportOptions::default(),
    );

    if importer.reset(&label)? {
        println!("{} Deleted ledger and statement for {}", style("✓").green(), label);
    } else {
        println!("{} Nothing to delete for {}", style("ℹ").blue(), label);
    }

    Ok(())
}
