use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    IntegrityReport, Rupiah, Snapshot, Transaction, TransactionKind, build_integrity_report,
    next_balance, now_local, parse_amount,
};
use crate::io::{ActivityLogFile, SpreadsheetMirror};
use crate::storage::Repository;

use super::{AccountError, ActivityLog, BalanceStore, Mirror, TransactionLedger};

/// The piggy bank: one running balance plus the stores every change is
/// written to. This is the primary interface for any front end.
pub struct Account<B, L, M, A> {
    balance_store: B,
    ledger: L,
    mirror: M,
    activity_log: A,
    balance: Rupiah,
}

/// Account backed by the SQLite database and the two local files.
pub type LocalAccount = Account<Repository, Repository, SpreadsheetMirror, ActivityLogFile>;

/// Outcome of a successful deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction: Transaction,
    /// Balance after the transaction
    pub balance: Rupiah,
}

impl LocalAccount {
    /// Open (creating when missing) the database, mirror and log named by
    /// `config`, and load the persisted balance.
    pub async fn open_local(config: &Config) -> Result<Self, AccountError> {
        let repo = Repository::init(&config.database).await?;
        let mirror = SpreadsheetMirror::open(&config.mirror)?;
        let activity_log = ActivityLogFile::new(&config.activity_log);
        Self::open(repo.clone(), repo, mirror, activity_log).await
    }

    /// Ledger transactions, oldest first. With a limit, only the most
    /// recent `limit` are returned.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<Transaction>, AccountError> {
        Ok(self.ledger.list_transactions(limit).await?)
    }

    /// Compare the stored balance against the ledger and the mirror.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AccountError> {
        let stored = self.balance_store.read_balance().await?;
        let totals = self.ledger.ledger_totals().await?;
        let mirror_rows = self.mirror.count_rows()?;
        Ok(build_integrity_report(stored, totals, mirror_rows))
    }
}

impl<B, L, M, A> Account<B, L, M, A>
where
    B: BalanceStore,
    L: TransactionLedger,
    M: Mirror,
    A: ActivityLog,
{
    /// Build an account over the given stores, reading the current balance.
    pub async fn open(
        balance_store: B,
        ledger: L,
        mirror: M,
        activity_log: A,
    ) -> Result<Self, AccountError> {
        let balance = balance_store.read_balance().await?;
        debug!(balance, "loaded balance");

        Ok(Self {
            balance_store,
            ledger,
            mirror,
            activity_log,
            balance,
        })
    }

    /// Current balance as last persisted by this session.
    pub fn balance(&self) -> Rupiah {
        self.balance
    }

    pub fn balance_store(&self) -> &B {
        &self.balance_store
    }

    pub async fn deposit(&mut self, input: &str) -> Result<Receipt, AccountError> {
        self.apply(TransactionKind::Deposit, input).await
    }

    pub async fn withdraw(&mut self, input: &str) -> Result<Receipt, AccountError> {
        self.apply(TransactionKind::Withdrawal, input).await
    }

    /// Validate `input` and apply it, stamped with the current local time.
    pub async fn apply(
        &mut self,
        kind: TransactionKind,
        input: &str,
    ) -> Result<Receipt, AccountError> {
        self.apply_at(kind, input, now_local()).await
    }

    /// Validate `input` and apply it with an explicit timestamp.
    ///
    /// Rejections (bad number, non-positive amount, insufficient balance)
    /// happen before any store is touched. On success the writes happen in
    /// a fixed order: balance, ledger, mirror, activity log.
    pub async fn apply_at(
        &mut self,
        kind: TransactionKind,
        input: &str,
        timestamp: NaiveDateTime,
    ) -> Result<Receipt, AccountError> {
        let (amount, balance) = match self.validate(kind, input) {
            Ok(validated) => validated,
            Err(err) => {
                debug!(kind = kind.as_str(), input, error = %err, "rejected");
                return Err(err);
            }
        };

        self.balance_store.write_balance(balance).await?;
        self.balance = balance;

        let transaction = self.ledger.append(kind, amount, timestamp).await?;
        let snapshot = Snapshot::new(&transaction, balance);
        self.mirror.append_row(&snapshot)?;
        self.activity_log.record(&snapshot.log_line())?;

        info!(
            id = transaction.id,
            kind = kind.as_str(),
            amount,
            balance,
            "transaction applied"
        );

        Ok(Receipt {
            transaction,
            balance,
        })
    }

    /// Returns the parsed amount and the balance it would produce.
    fn validate(
        &self,
        kind: TransactionKind,
        input: &str,
    ) -> Result<(Rupiah, Rupiah), AccountError> {
        let amount = parse_amount(input)?;
        let balance = next_balance(kind, self.balance, amount)?;
        Ok((amount, balance))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::{Result, bail};
    use chrono::NaiveDate;

    use super::*;

    #[derive(Default)]
    struct State {
        balance: Rupiah,
        transactions: Vec<Transaction>,
        rows: Vec<Snapshot>,
        lines: Vec<String>,
        /// Every write, in the order it happened
        events: Vec<&'static str>,
        fail_balance_write: bool,
    }

    /// One shared in-memory backend standing in for all four stores.
    #[derive(Clone, Default)]
    struct Fake(Rc<RefCell<State>>);

    impl Fake {
        fn with_balance(balance: Rupiah) -> Self {
            let fake = Self::default();
            fake.0.borrow_mut().balance = balance;
            fake
        }

        fn writes(&self) -> usize {
            self.0.borrow().events.len()
        }
    }

    impl BalanceStore for Fake {
        async fn read_balance(&self) -> Result<Rupiah> {
            Ok(self.0.borrow().balance)
        }

        async fn write_balance(&self, balance: Rupiah) -> Result<()> {
            let mut state = self.0.borrow_mut();
            if state.fail_balance_write {
                bail!("disk unavailable");
            }
            state.balance = balance;
            state.events.push("balance");
            Ok(())
        }
    }

    impl TransactionLedger for Fake {
        async fn append(
            &self,
            kind: TransactionKind,
            amount: Rupiah,
            timestamp: NaiveDateTime,
        ) -> Result<Transaction> {
            let mut state = self.0.borrow_mut();
            let tx = Transaction {
                id: state.transactions.len() as i64 + 1,
                kind,
                amount,
                timestamp,
            };
            state.transactions.push(tx.clone());
            state.events.push("ledger");
            Ok(tx)
        }
    }

    impl Mirror for Fake {
        fn append_row(&self, row: &Snapshot) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.rows.push(row.clone());
            state.events.push("mirror");
            Ok(())
        }
    }

    impl ActivityLog for Fake {
        fn record(&self, line: &str) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.lines.push(line.to_string());
            state.events.push("log");
            Ok(())
        }
    }

    async fn open(fake: &Fake) -> Account<Fake, Fake, Fake, Fake> {
        Account::open(fake.clone(), fake.clone(), fake.clone(), fake.clone())
            .await
            .unwrap()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_reads_persisted_balance() {
        let fake = Fake::with_balance(4200);
        let account = open(&fake).await;
        assert_eq!(account.balance(), 4200);
        assert_eq!(fake.writes(), 0);
    }

    #[tokio::test]
    async fn test_deposit_from_zero() {
        let fake = Fake::default();
        let mut account = open(&fake).await;

        let receipt = account
            .apply_at(TransactionKind::Deposit, "100", noon())
            .await
            .unwrap();

        assert_eq!(receipt.balance, 100);
        assert_eq!(receipt.transaction.amount, 100);
        assert_eq!(receipt.transaction.kind, TransactionKind::Deposit);
        assert_eq!(account.balance(), 100);

        let state = fake.0.borrow();
        assert_eq!(state.balance, 100);
        assert_eq!(state.transactions.len(), 1);
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].balance, 100);
        assert_eq!(state.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_within_balance() {
        let fake = Fake::with_balance(100);
        let mut account = open(&fake).await;

        let receipt = account.withdraw("50").await.unwrap();

        assert_eq!(receipt.balance, 50);
        assert_eq!(fake.0.borrow().balance, 50);
    }

    #[tokio::test]
    async fn test_withdraw_more_than_balance_rejected() {
        let fake = Fake::with_balance(30);
        let mut account = open(&fake).await;

        let err = account.withdraw("50").await.unwrap_err();

        assert!(matches!(
            err,
            AccountError::InsufficientBalance {
                balance: 30,
                requested: 50
            }
        ));
        assert!(err.is_rejection());
        assert_eq!(account.balance(), 30);
        assert_eq!(fake.writes(), 0);
    }

    #[tokio::test]
    async fn test_invalid_inputs_touch_nothing() {
        let fake = Fake::with_balance(10);
        let mut account = open(&fake).await;

        let err = account.deposit("-5").await.unwrap_err();
        assert!(matches!(err, AccountError::NonPositiveAmount(-5)));

        let err = account.deposit("abc").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidNumber(ref s) if s == "abc"));

        let err = account.withdraw("0").await.unwrap_err();
        assert!(matches!(err, AccountError::NonPositiveAmount(0)));

        let err = account.withdraw("").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidNumber(_)));

        assert_eq!(account.balance(), 10);
        assert_eq!(fake.writes(), 0);
        let state = fake.0.borrow();
        assert!(state.transactions.is_empty());
        assert!(state.rows.is_empty());
        assert!(state.lines.is_empty());
    }

    /// Log sink that keeps everything a subscriber writes.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rejections_are_not_logged_as_warnings() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let fake = Fake::with_balance(10);
        let mut account = open(&fake).await;
        let _ = account.deposit("-5").await;
        let _ = account.withdraw("50").await;

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("rejected").count(), 2, "{}", output);
        assert!(!output.contains("WARN"), "{}", output);
        assert!(!output.contains("ERROR"), "{}", output);
    }

    #[tokio::test]
    async fn test_overflowing_deposit_rejected() {
        let fake = Fake::with_balance(i64::MAX - 1);
        let mut account = open(&fake).await;

        let err = account.deposit("2").await.unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
        assert_eq!(fake.writes(), 0);
    }

    #[tokio::test]
    async fn test_writes_happen_in_order_and_agree() {
        let fake = Fake::default();
        let mut account = open(&fake).await;

        account
            .apply_at(TransactionKind::Deposit, "250", noon())
            .await
            .unwrap();

        let state = fake.0.borrow();
        assert_eq!(state.events, vec!["balance", "ledger", "mirror", "log"]);
        assert_eq!(state.transactions[0].timestamp, noon());
        assert_eq!(state.rows[0].timestamp, noon());
        assert_eq!(state.rows[0].balance, 250);
        assert_eq!(
            state.lines[0],
            "2024-05-01 12:00:00 | Deposit | Rp250 | Saldo: Rp250"
        );
    }

    #[tokio::test]
    async fn test_balance_matches_ledger_over_a_sequence() {
        let fake = Fake::default();
        let mut account = open(&fake).await;

        let steps = [
            (TransactionKind::Deposit, "100"),
            (TransactionKind::Withdrawal, "40"),
            (TransactionKind::Withdrawal, "70"), // rejected
            (TransactionKind::Deposit, "15"),
            (TransactionKind::Deposit, "x"), // rejected
            (TransactionKind::Withdrawal, "75"),
            (TransactionKind::Deposit, "3"),
        ];
        for (kind, input) in steps {
            let _ = account.apply(kind, input).await;
            assert!(account.balance() >= 0);
        }

        let state = fake.0.borrow();
        assert_eq!(account.balance(), 3);
        assert_eq!(
            crate::domain::compute_balance(&state.transactions),
            account.balance()
        );
        assert_eq!(state.transactions.len(), 5);
        assert_eq!(state.rows.len(), 5);
        assert_eq!(state.lines.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_balance_write_keeps_memory_in_sync() {
        let fake = Fake::with_balance(100);
        let mut account = open(&fake).await;
        fake.0.borrow_mut().fail_balance_write = true;

        let err = account.deposit("10").await.unwrap_err();

        assert!(!err.is_rejection());
        assert_eq!(account.balance(), 100);
        assert!(fake.0.borrow().transactions.is_empty());
    }
}
