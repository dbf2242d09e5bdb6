//! Process command - extract data from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use labledger_core::invoice::rules::format_usd;
use labledger_core::models::invoice::ParsedInvoice;
use labledger_core::models::ledger::{bucket_key, format_us_date};
use labledger_core::{process_document, DefaultConverter, ExtractionResult, RuleInvoiceParser};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also print the normalized text the fields were read from
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// JSON shape: the invoice plus where it would be filed.
#[derive(Serialize)]
struct ProcessOutput<'a> {
    #[serde(flatten)]
    invoice: &'a ParsedInvoice,
    bucket: String,
    warnings: &'a [String],
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let converter =
        DefaultConverter::new().with_native_text_first(config.extraction.prefer_native_text);
    let parser = RuleInvoiceParser::new().with_strategy(config.extraction.aggregation);

    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || {
        process_document(&converter, &parser, &input)
    })
    .await??;

    if !result.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_text {
        println!();
        println!("{}", style("Normalized text:").bold());
        println!("{}", result.normalized_text);
    }

    debug!(
        "Parsed in {}ms, total {:?}",
        result.processing_time_ms,
        start.elapsed()
    );

    Ok(())
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ProcessOutput {
            invoice: &result.invoice,
            bucket: bucket_key(result.invoice.date_due).to_string(),
            warnings: &result.warnings,
        })?),
        OutputFormat::Csv => format_csv(&result.invoice),
        OutputFormat::Text => Ok(format_text(&result.invoice)),
    }
}

fn format_csv(invoice: &ParsedInvoice) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "Dentist Name",
        "Patient Name",
        "Date Due",
        "Total Units",
        "Unit Price",
        "Alloys/Extras",
        "Total Cost",
    ])?;

    wtr.write_record([
        invoice.dentist_name.clone(),
        invoice.patient_name.clone(),
        format_us_date(invoice.date_due),
        invoice.total_units.to_string(),
        invoice.unit_price_or_zero().to_string(),
        invoice.alloys_extras_cost.to_string(),
        invoice.total_cost.to_string(),
    ])?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(invoice: &ParsedInvoice) -> String {
    let mut output = String::new();

    output.push_str(&format!("Dentist: {}\n", invoice.dentist_name));
    output.push_str(&format!("Patient: {}\n", invoice.patient_name));
    output.push_str(&format!("Due:     {}\n", format_us_date(invoice.date_due)));
    output.push_str(&format!("Month:   {}\n", bucket_key(invoice.date_due)));
    output.push('\n');

    output.push_str("Line items:\n");
    for item in &invoice.line_items {
        output.push_str(&format!(
            "  {:<30} {:>4} x {:>10} = {:>10}\n",
            item.description,
            item.quantity,
            format_usd(item.unit_price),
            format_usd(item.cost)
        ));
    }
    output.push('\n');

    output.push_str(&format!("Units:         {}\n", invoice.total_units));
    output.push_str(&format!(
        "Unit price:    {}\n",
        format_usd(invoice.unit_price_or_zero())
    ));
    output.push_str(&format!(
        "Alloys/Extras: {}\n",
        format_usd(invoice.alloys_extras_cost)
    ));
    output.push_str(&format!("Total:         {}\n", format_usd(invoice.total_cost)));

    output
}
