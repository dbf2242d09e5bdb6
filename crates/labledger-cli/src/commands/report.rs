//! Report command - re-render a month's statement from its ledger.

use std::path::PathBuf;

use clap::Args;
use console::style;

use labledger_core::{
    CsvLedgerStore, FileReportSink, ImportOptions, Importer, StatementRenderer,
};

use super::{load_config, output_dir, parse_month};

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Month to render (YYYY-MM)
    month: String,

    /// Base directory holding the month folders
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Dentist named in the statement title
    #[arg(long)]
    dentist: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pdf")]
    format: ReportFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    /// Write the statement PDF next to the ledger
    Pdf,
    /// Print the statement as text
    Text,
}

pub async fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let label = parse_month(&args.month)?;
    let base_dir = output_dir(&config, args.output_dir);

    let store = CsvLedgerStore::new(&base_dir);
    if !store.ledger_path(&label).exists() {
        anyhow::bail!(
            "No ledger for {} at {}",
            label,
            store.ledger_path(&label).display()
        );
    }

    let mut options = ImportOptions::from_config(&config)?;
    if args.dentist.is_some() {
        options.dentist_override = args.dentist;
    }
    let importer = Importer::new(
        store,
        FileReportSink::new(&base_dir),
        config.lab.clone(),
        options,
    );

    match args.format {
        ReportFormat::Pdf => {
            let location = importer.republish(&label, None)?;
            println!(
                "{} Statement written to {}",
                style("✓").green(),
                location
            );
        }
        ReportFormat::Text => {
            let records = importer.ledger().load(&label)?;
            let statement = StatementRenderer::new(config.lab)
                .with_dentist(importer.options().dentist_override.clone())
                .build(&label, &records)?;
            print!("{}", statement.to_text());
        }
    }

    Ok(())
}
