// Capabilities the account needs from the outside world. The SQLite
// repository and the file sinks implement these; tests use in-memory fakes.
#![allow(async_fn_in_trait)]

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::domain::{Rupiah, Snapshot, Transaction, TransactionKind};

/// The persisted singleton balance.
pub trait BalanceStore {
    async fn read_balance(&self) -> Result<Rupiah>;
    async fn write_balance(&self, balance: Rupiah) -> Result<()>;
}

/// Durable, append-only transaction history.
pub trait TransactionLedger {
    /// Append a transaction and return it with its assigned id.
    async fn append(
        &self,
        kind: TransactionKind,
        amount: Rupiah,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction>;
}

/// Human-readable spreadsheet copy of the ledger.
pub trait Mirror {
    fn append_row(&self, row: &Snapshot) -> Result<()>;
}

/// Plain-text audit trail.
pub trait ActivityLog {
    fn record(&self, line: &str) -> Result<()>;
}
