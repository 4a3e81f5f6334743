use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tally::cli::add::NewTransaction;
use tally::core::log::init_logging;
use tally::core::transaction::TransactionType;
use tally::export::EXPORT_FILE_NAME;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Income,
    Expense,
}

impl From<Kind> for TransactionType {
    fn from(kind: Kind) -> TransactionType {
        match kind {
            Kind::Income => TransactionType::Income,
            Kind::Expense => TransactionType::Expense,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display balance, monthly statistics and spending
    Summary,
    /// Record an income or expense
    Add {
        kind: Kind,
        /// Description of the transaction
        #[arg(short, long)]
        name: String,
        /// Non-negative amount
        #[arg(short, long)]
        amount: Decimal,
        /// Category label
        #[arg(short, long)]
        tag: String,
        /// Date as YYYY-MM-DD, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Export all transactions as CSV
    Export {
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },
    /// Add every transaction from a CSV export
    Import { input: PathBuf },
}

impl From<Commands> for tally::AppCommand {
    fn from(cmd: Commands) -> tally::AppCommand {
        match cmd {
            Commands::Summary => tally::AppCommand::Summary,
            Commands::Add {
                kind,
                name,
                amount,
                tag,
                date,
            } => tally::AppCommand::Add(NewTransaction {
                kind: kind.into(),
                name,
                amount,
                tag,
                date,
            }),
            Commands::Export { output } => tally::AppCommand::Export { output },
            Commands::Import { input } => tally::AppCommand::Import { input },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tally::cli::setup::setup(),
        Some(cmd) => tally::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
