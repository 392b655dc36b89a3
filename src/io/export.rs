use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LocalAccount;
use crate::domain::{Rupiah, Transaction, format_timestamp, now_local};

/// Full ledger dump for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerExport {
    pub version: String,
    pub exported_at: NaiveDateTime,
    pub balance: Rupiah,
    pub transactions: Vec<Transaction>,
}

/// Exporter for writing the ledger out in other formats
pub struct Exporter<'a> {
    account: &'a LocalAccount,
}

impl<'a> Exporter<'a> {
    pub fn new(account: &'a LocalAccount) -> Self {
        Self { account }
    }

    /// Export transactions to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.account.history(None).await?;
        write_transactions_csv(&transactions, writer)
    }

    /// Export balance and transactions as one JSON document
    pub async fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let transactions = self.account.history(None).await?;
        let count = transactions.len();

        let export = LedgerExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: now_local(),
            balance: self.account.balance(),
            transactions,
        };

        serde_json::to_writer_pretty(&mut writer, &export)?;
        writer.flush()?;
        Ok(count)
    }
}

fn write_transactions_csv<W: Write>(transactions: &[Transaction], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["id", "timestamp", "kind", "amount"])?;

    for transaction in transactions {
        csv_writer.write_record(&[
            transaction.id.to_string(),
            format_timestamp(transaction.timestamp),
            transaction.kind.as_str().to_string(),
            transaction.amount.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(transactions.len())
}
