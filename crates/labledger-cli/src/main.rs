//! CLI application for dental-lab invoice ledgers.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, import, ledger, process, report, reset};

/// Lab ledger - turn dental-lab invoices into monthly ledgers and statements
#[derive(Parser)]
#[command(name = "labledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a single invoice without touching any ledger
    Process(process::ProcessArgs),

    /// Import invoices into their monthly ledgers
    Import(import::ImportArgs),

    /// Show the ledger of a month
    Ledger(ledger::LedgerArgs),

    /// Render the statement of a month
    Report(report::ReportArgs),

    /// Delete a month's ledger and statement
    Reset(reset::ResetArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Import(args) => import::run(args, config_path).await,
        Commands::Ledger(args) => ledger::run(args, config_path).await,
        Commands::Report(args) => report::run(args, config_path).await,
        Commands::Reset(args) => reset::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
