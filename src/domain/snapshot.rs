use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Rupiah, Transaction, TransactionKind, format_timestamp};

/// A transaction together with the balance it left behind.
/// This is the shape of a spreadsheet mirror row and of an activity log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub kind: TransactionKind,
    pub amount: Rupiah,
    pub balance: Rupiah,
}

impl Snapshot {
    pub fn new(transaction: &Transaction, balance: Rupiah) -> Self {
        Self {
            timestamp: transaction.timestamp,
            kind: transaction.kind,
            amount: transaction.amount,
            balance,
        }
    }

    /// `timestamp | kind | Rp<amount> | Saldo: Rp<balance>`
    pub fn log_line(&self) -> String {
        format!(
            "{} | {} | Rp{} | Saldo: Rp{}",
            format_timestamp(self.timestamp),
            self.kind.label(),
            self.amount,
            self.balance
        )
    }
}
