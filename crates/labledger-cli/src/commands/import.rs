//! Import command - parse many invoices and merge them into monthly ledgers.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use labledger_core::invoice::rules::format_usd;
use labledger_core::{
    process_document, CsvLedgerStore, DefaultConverter, DocumentFailure, ExtractionResult,
    FileReportSink, ImportOptions, Importer, LabError, LedgerStore, RuleInvoiceParser,
};

use super::{load_config, output_dir, parse_month};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Base directory holding the month folders
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Dentist printed on statements instead of the extracted name
    #[arg(long)]
    dentist: Option<String>,

    /// File every invoice under this month (YYYY-MM)
    #[arg(long)]
    month: Option<String>,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Skip writing statements
    #[arg(long)]
    no_report: bool,
}

/// Outcome of converting and parsing one file.
struct ParsedFile {
    index: usize,
    path: PathBuf,
    result: Result<ExtractionResult, LabError>,
}

pub async fn run(args: ImportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut options = ImportOptions::from_config(&config)?;
    if let Some(month) = &args.month {
        options.month_override = Some(parse_month(month)?);
    }
    if let Some(dentist) = args.dentist.as_deref().map(str::trim) {
        if !dentist.is_empty() {
            options.dentist_override = Some(dentist.to_string());
        }
    }
    if args.no_report {
        options.write_report = false;
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!(
            "No matching files found for pattern: {}",
            args.inputs.join(" ")
        );
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    let converter = Arc::new(
        DefaultConverter::new().with_native_text_first(config.extraction.prefer_native_text),
    );
    let parser = Arc::new(RuleInvoiceParser::new().with_strategy(config.extraction.aggregation));

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let converter = converter.clone();
        let parser = parser.clone();
        tasks.spawn_blocking(move || {
            let result = process_document(converter.as_ref(), parser.as_ref(), &path);
            drop(permit);
            ParsedFile {
                index,
                path,
                result,
            }
        });
    }

    let mut parsed = Vec::with_capacity(files.len());
    let mut lost = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(file) => parsed.push(file),
            Err(e) => {
                error!("Worker task failed: {}", e);
                lost.push(e.to_string());
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("Complete");

    // A failed task loses its path; recover it from the indices that never came back.
    if !lost.is_empty() {
        let done: BTreeSet<usize> = parsed.iter().map(|file| file.index).collect();
        let missing = files
            .iter()
            .enumerate()
            .filter(|(index, _)| !done.contains(index));
        for ((index, path), reason) in missing.zip(lost) {
            parsed.push(ParsedFile {
                index,
                path: path.clone(),
                result: Err(LabError::Panicked(reason)),
            });
        }
    }

    // Merge order follows input order, not completion order.
    parsed.sort_by_key(|file| file.index);

    let mut invoices = Vec::new();
    let mut failures = Vec::new();
    for file in parsed {
        match file.result {
            Ok(result) => {
                debug!(
                    "{}: {} / {} ({})",
                    file.path.display(),
                    result.invoice.dentist_name,
                    result.invoice.patient_name,
                    result.invoice.total_cost
                );
                invoices.push(result.invoice);
            }
            Err(e) if e.is_document_error() => {
                warn!("Failed to process {}: {}", file.path.display(), e);
                failures.push(DocumentFailure {
                    source: file.path,
                    error: e,
                });
            }
            Err(e) => {
                error!("Failed to process {}: {}", file.path.display(), e);
                return Err(e.into());
            }
        }
    }

    let base_dir = output_dir(&config, args.output_dir);
    let importer = Importer::new(
        CsvLedgerStore::new(&base_dir),
        FileReportSink::new(&base_dir),
        config.lab.clone(),
        options,
    );
    let buckets = importer.commit(&invoices)?;

    println!();
    println!(
        "{} Imported {} of {} files in {:?}",
        style("✓").green(),
        invoices.len(),
        files.len(),
        start.elapsed()
    );

    for bucket in &buckets {
        let outcome = &bucket.outcome;
        println!(
            "   {}: {} added, {} updated, {} rows, total {}",
            style(&outcome.label).bold(),
            style(outcome.inserted).green(),
            style(outcome.updated).yellow(),
            outcome.records.len(),
            format_usd(outcome.total)
        );
        println!(
            "      ledger:    {}",
            importer.ledger().store().describe(&outcome.label)
        );
        if let Some(statement) = &bucket.statement {
            println!("      statement: {}", statement);
        }
    }

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in &failures {
            println!("  - {}: {}", failure.source.display(), failure.error);
        }
    }

    Ok(())
}

/// Expand every input as a glob pattern, keeping regular files only.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for input in inputs {
        let matches: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!("No files match {}", input);
        }
        files.extend(matches);
    }
    Ok(files.into_iter().collect())
}
