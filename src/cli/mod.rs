use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LocalAccount, Receipt};
use crate::config::Config;
use crate::domain::{TransactionKind, format_rupiah, format_timestamp};
use crate::io::export::Exporter;

mod shell;

pub use shell::*;

/// Celengan - a local-first piggy bank
#[derive(Parser)]
#[command(name = "celengan")]
#[command(about = "Track one savings balance: deposits, withdrawals and their history")]
#[command(version)]
pub struct Cli {
    /// Directory holding the database, spreadsheet mirror and activity log
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// Database file (relative to the data directory)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Spreadsheet mirror file, written as CSV (relative to the data directory)
    #[arg(long, global = true)]
    pub mirror: Option<PathBuf>,

    /// Activity log file (relative to the data directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Omit to start the interactive session
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session (the default)
    Shell,

    /// Put money into the piggy bank
    Deposit {
        /// Whole amount in Rupiah
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Take money out of the piggy bank
    Withdraw {
        /// Whole amount in Rupiah
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Show the current balance
    Balance,

    /// List recorded transactions
    History {
        /// Show only the most recent N transactions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Verify that balance, ledger and spreadsheet mirror agree
    Check,

    /// Export the ledger to CSV or JSON
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::resolve(
            &self.data_dir,
            self.database.clone(),
            self.mirror.clone(),
            self.log_file.clone(),
        )
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })?;
        let mut account = LocalAccount::open_local(&config).await?;

        match self.command.unwrap_or(Commands::Shell) {
            Commands::Shell => {
                let stdin = io::stdin();
                let stdout = io::stdout();
                run_shell(&mut account, stdin.lock(), stdout.lock()).await?;
            }

            Commands::Deposit { amount } => {
                let receipt = account.deposit(&amount).await?;
                println!("{}", receipt_message(&receipt));
                println!("Balance: {}", format_rupiah(receipt.balance));
            }

            Commands::Withdraw { amount } => {
                let receipt = account.withdraw(&amount).await?;
                println!("{}", receipt_message(&receipt));
                println!("Balance: {}", format_rupiah(receipt.balance));
            }

            Commands::Balance => {
                println!("Balance: {}", format_rupiah(account.balance()));
            }

            Commands::History { limit } => {
                run_history_command(&account, limit).await?;
            }

            Commands::Check => {
                run_check_command(&account).await?;
            }

            Commands::Export { format, output } => {
                run_export_command(&account, &format, output).await?;
            }
        }

        Ok(())
    }
}

/// One-line confirmation for a successful transaction.
pub fn receipt_message(receipt: &Receipt) -> String {
    let amount = format_rupiah(receipt.transaction.amount);
    match receipt.transaction.kind {
        TransactionKind::Deposit => format!("Saved {} to the piggy bank.", amount),
        TransactionKind::Withdrawal => format!("Took {} out of the piggy bank.", amount),
    }
}

async fn run_history_command(account: &LocalAccount, limit: Option<usize>) -> Result<()> {
    let transactions = account.history(limit).await?;

    if transactions.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!(
        "{:>5} {:<20} {:<10} {:>15}",
        "ID", "TIMESTAMP", "KIND", "AMOUNT"
    );
    println!("{}", "-".repeat(53));
    for tx in &transactions {
        println!(
            "{:>5} {:<20} {:<10} {:>15}",
            tx.id,
            format_timestamp(tx.timestamp),
            tx.kind.label(),
            format_rupiah(tx.amount)
        );
    }
    Ok(())
}

async fn run_check_command(account: &LocalAccount) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = account.check_integrity().await?;

    println!("Transactions:   {}", report.ledger.count);
    println!("Deposits:       {}", format_rupiah(report.ledger.deposits));
    println!("Withdrawals:    {}", format_rupiah(report.ledger.withdrawals));
    println!("Ledger balance: {}", format_rupiah(report.ledger.net()));
    println!("Stored balance: {}", format_rupiah(report.stored_balance));
    match report.mirror_rows {
        Some(rows) => println!("Mirror rows:    {}", rows),
        None => println!("Mirror rows:    (file missing)"),
    }
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    account: &LocalAccount,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let exporter = Exporter::new(account);

    let writer: Box<dyn io::Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };

    let count = match format {
        "csv" => exporter.export_transactions_csv(writer).await?,
        "json" => exporter.export_json(writer).await?,
        other => anyhow::bail!("Unknown export format '{}'. Use csv or json", other),
    };

    if let Some(path) = output {
        eprintln!("Exported {} transaction(s) to {}", count, path.display());
    }
    Ok(())
}
