//! Ledger command - show the records of one month.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use labledger_core::invoice::rules::format_usd;
use labledger_core::{
    checked_total, CsvLedgerStore, Ledger, LedgerRecord, LedgerStore, MonthLabel,
};

use super::{load_config, output_dir, parse_month};

/// Arguments for the ledger command.
#[derive(Args)]
pub struct LedgerArgs {
    /// Month to show (YYYY-MM)
    month: String,

    /// Base directory holding the month folders
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: LedgerFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LedgerFormat {
    /// Aligned table with a total row
    Text,
    /// The ledger file's own CSV layout
    Csv,
    /// JSON document
    Json,
}

#[derive(Serialize)]
struct LedgerOutput<'a> {
    month: &'a MonthLabel,
    records: &'a [LedgerRecord],
    total: String,
}

pub async fn run(args: LedgerArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let label = parse_month(&args.month)?;
    let store = CsvLedgerStore::new(output_dir(&config, args.output_dir));

    let path = store.ledger_path(&label);
    if !path.exists() {
        anyhow::bail!("No ledger for {} at {}", label, path.display());
    }

    let ledger = Ledger::new(store);
    let records = ledger.load(&label)?;
    let total = checked_total(&records)
        .map(format_usd)
        .ok_or_else(|| anyhow::anyhow!("Total of {} is out of range", label))?;

    match args.format {
        LedgerFormat::Text => {
            println!(
                "{} {} ({})",
                style("Ledger").bold(),
                label,
                ledger.store().describe(&label)
            );
            println!();
            print!("{}", format_text(&records, &total));
        }
        LedgerFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["Date Due", "Patient Name", "Total Cost"])?;
            for record in &records {
                wtr.write_record([
                    record.date_due.display(),
                    record.patient_name.clone(),
                    format_usd(record.total_cost),
                ])?;
            }
            print!("{}", String::from_utf8(wtr.into_inner()?)?);
        }
        LedgerFormat::Json => {
            let output = LedgerOutput {
                month: &label,
                records: &records,
                total,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn format_text(records: &[LedgerRecord], total: &str) -> String {
    let name_width = records
        .iter()
        .map(|r| r.patient_name.chars().count())
        .chain(std::iter::once("Patient Name".len()))
        .max()
        .unwrap_or(0);

    let mut output = format!(
        "{:<10}  {:<name_width$}  {:>12}\n",
        "Date Due", "Patient Name", "Total Cost"
    );
    for record in records {
        output.push_str(&format!(
            "{:<10}  {:<name_width$}  {:>12}\n",
            record.date_due.display(),
            record.patient_name,
            format_usd(record.total_cost)
        ));
    }
    output.push_str(&format!("{:<10}  {:>name_width$}  {:>12}\n", "", "TOTAL:", total));
    output
}
