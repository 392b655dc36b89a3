use super::{Rupiah, Transaction, TransactionKind};

/// Compute the balance that follows applying `amount` of `kind` to `balance`.
/// The balance may never go negative and amounts must be positive.
pub fn next_balance(
    kind: TransactionKind,
    balance: Rupiah,
    amount: Rupiah,
) -> Result<Rupiah, BalanceError> {
    if amount <= 0 {
        return Err(BalanceError::NonPositiveAmount(amount));
    }

    match kind {
        TransactionKind::Deposit => balance
            .checked_add(amount)
            .ok_or(BalanceError::Overflow { balance, amount }),
        TransactionKind::Withdrawal => {
            if amount > balance {
                Err(BalanceError::Insufficient {
                    balance,
                    requested: amount,
                })
            } else {
                Ok(balance - amount)
            }
        }
    }
}

/// Derive the balance from the ledger alone.
/// Balance = sum of deposits - sum of withdrawals
pub fn compute_balance(transactions: &[Transaction]) -> Rupiah {
    transactions
        .iter()
        .fold(0, |balance, tx| balance + tx.kind.signed(tx.amount))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    NonPositiveAmount(Rupiah),
    Insufficient { balance: Rupiah, requested: Rupiah },
    Overflow { balance: Rupiah, amount: Rupiah },
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than 0 (got {})", amount)
            }
            BalanceError::Insufficient { balance, requested } => write!(
                f,
                "Insufficient balance: requested {} but only {} available",
                requested, balance
            ),
            BalanceError::Overflow { balance, amount } => write!(
                f,
                "Depositing {} onto a balance of {} exceeds the largest storable amount",
                amount, balance
            ),
        }
    }
}

impl std::error::Error for BalanceError {}

/// Totals read back from the ledger. Sums are widened to `i128` because
/// the deposit total alone may pass `i64::MAX` while the balance stays in
/// range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub deposits: i128,
    pub withdrawals: i128,
    pub count: i64,
}

impl LedgerTotals {
    pub fn record(&mut self, kind: TransactionKind, amount: Rupiah) {
        match kind {
            TransactionKind::Deposit => self.deposits += i128::from(amount),
            TransactionKind::Withdrawal => self.withdrawals += i128::from(amount),
        }
        self.count += 1;
    }

    pub fn net(&self) -> i128 {
        self.deposits - self.withdrawals
    }
}

/// Result of comparing the persisted balance with what the ledger and the
/// mirror say it should be.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub stored_balance: Rupiah,
    pub ledger: LedgerTotals,
    pub mirror_rows: Option<usize>,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn build_integrity_report(
    stored_balance: Rupiah,
    ledger: LedgerTotals,
    mirror_rows: Option<usize>,
) -> IntegrityReport {
    let mut issues = Vec::new();

    if stored_balance < 0 {
        issues.push(format!("Stored balance is negative: {}", stored_balance));
    }

    if Rupiah::try_from(ledger.net()).is_err() {
        issues.push(format!(
            "Ledger balance {} is outside the storable range",
            ledger.net()
        ));
    }

    if i128::from(stored_balance) != ledger.net() {
        issues.push(format!(
            "Stored balance {} differs from ledger balance {} (deposits {} - withdrawals {})",
            stored_balance,
            ledger.net(),
            ledger.deposits,
            ledger.withdrawals
        ));
    }

    if let Some(rows) = mirror_rows {
        if rows as i64 != ledger.count {
            issues.push(format!(
                "Spreadsheet mirror has {} rows but the ledger has {} transactions",
                rows, ledger.count
            ));
        }
    }

    IntegrityReport {
        stored_balance,
        ledger,
        mirror_rows,
        issues,
    }
}
