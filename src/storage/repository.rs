use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::debug;

use crate::application::{BalanceStore, TransactionLedger};
use crate::domain::{
    LedgerTotals, Rupiah, Transaction, TransactionKind, format_timestamp, parse_timestamp,
};

use super::MIGRATION_001_INITIAL;

/// Repository for the balance and the transaction ledger.
///
/// No connection is held between calls: every operation opens the database,
/// runs its statement and closes it again.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl Repository {
    /// Point a repository at a SQLite file. The file is created on first
    /// connection if it doesn't exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        Self { path, options }
    }

    /// Create the tables (when missing) and seed the balance row.
    pub async fn migrate(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&mut conn)
            .await
            .context("Failed to run migration 001")?;
        conn.close().await.context("Failed to close database")?;
        Ok(())
    }

    /// Initialize the database at `path` (create + migrate).
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Self::new(path);
        repo.migrate().await?;
        debug!(path = %repo.path.display(), "database ready");
        Ok(repo)
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .with_context(|| format!("Failed to open database {}", self.path.display()))
    }

    // ========================
    // Balance
    // ========================

    async fn fetch_balance(&self) -> Result<Rupiah> {
        let mut conn = self.connect().await?;
        let row = sqlx::query("SELECT amount FROM balance WHERE id = 1")
            .fetch_optional(&mut conn)
            .await
            .context("Failed to read balance")?;
        conn.close().await.context("Failed to close database")?;

        Ok(row.map(|row| row.get::<Rupiah, _>("amount")).unwrap_or(0))
    }

    async fn store_balance(&self, balance: Rupiah) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            INSERT INTO balance (id, amount) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET amount = excluded.amount
            "#,
        )
        .bind(balance)
        .execute(&mut conn)
        .await
        .context("Failed to write balance")?;
        conn.close().await.context("Failed to close database")?;

        debug!(balance, "balance stored");
        Ok(())
    }

    // ========================
    // Ledger
    // ========================

    async fn insert_transaction(
        &self,
        kind: TransactionKind,
        amount: Rupiah,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (kind, amount, timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(kind.as_str())
        .bind(amount)
        .bind(format_timestamp(timestamp))
        .execute(&mut conn)
        .await
        .context("Failed to save transaction")?;
        conn.close().await.context("Failed to close database")?;

        let id = result.last_insert_rowid();
        debug!(id, kind = kind.as_str(), amount, "transaction stored");

        Ok(Transaction {
            id,
            kind,
            amount,
            timestamp,
        })
    }

    /// List transactions ordered by id. With `limit`, only the newest
    /// `limit` transactions are returned (still oldest first).
    pub async fn list_transactions(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let mut conn = self.connect().await?;
        let rows = match limit {
            Some(limit) => {
                sqlx::query(
                    r#"
                    SELECT id, kind, amount, timestamp FROM (
                        SELECT id, kind, amount, timestamp
                        FROM transactions
                        ORDER BY id DESC
                        LIMIT ?
                    )
                    ORDER BY id
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&mut conn)
                .await
            }
            None => {
                sqlx::query("SELECT id, kind, amount, timestamp FROM transactions ORDER BY id")
                    .fetch_all(&mut conn)
                    .await
            }
        }
        .context("Failed to list transactions")?;
        conn.close().await.context("Failed to close database")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Sum deposits and withdrawals over the whole ledger. The rows are
    /// folded here rather than with SQL `SUM`, which fails once the running
    /// deposit total passes `i64::MAX`.
    pub async fn ledger_totals(&self) -> Result<LedgerTotals> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query("SELECT kind, amount FROM transactions ORDER BY id")
            .fetch_all(&mut conn)
            .await
            .context("Failed to compute ledger totals")?;
        conn.close().await.context("Failed to close database")?;

        let mut totals = LedgerTotals::default();
        for row in &rows {
            let kind_str: String = row.get("kind");
            let kind = TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?;
            totals.record(kind, row.get::<Rupiah, _>("amount"));
        }

        Ok(totals)
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let kind_str: String = row.get("kind");
        let timestamp_str: String = row.get("timestamp");

        Ok(Transaction {
            id: row.get("id"),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount: row.get("amount"),
            timestamp: parse_timestamp(&timestamp_str)
                .with_context(|| format!("Invalid timestamp: {}", timestamp_str))?,
        })
    }
}

impl BalanceStore for Repository {
    async fn read_balance(&self) -> Result<Rupiah> {
        self.fetch_balance().await
    }

    async fn write_balance(&self, balance: Rupiah) -> Result<()> {
        self.store_balance(balance).await
    }
}

impl TransactionLedger for Repository {
    async fn append(
        &self,
        kind: TransactionKind,
        amount: Rupiah,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction> {
        self.insert_transaction(kind, amount, timestamp).await
    }
}
