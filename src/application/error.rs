use thiserror::Error;

use crate::domain::{BalanceError, ParseAmountError, Rupiah};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid number: '{0}' is not a whole amount")]
    InvalidNumber(String),

    #[error("Amount must be greater than 0 (got {0})")]
    NonPositiveAmount(Rupiah),

    #[error("Insufficient balance: requested Rp{requested}, available Rp{balance}")]
    InsufficientBalance { balance: Rupiah, requested: Rupiah },

    #[error("Deposit of Rp{amount} would overflow the balance of Rp{balance}")]
    BalanceOverflow { balance: Rupiah, amount: Rupiah },

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AccountError {
    /// True for validation failures: the input was refused and nothing was
    /// written anywhere.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AccountError::Storage(_))
    }
}

impl From<ParseAmountError> for AccountError {
    fn from(err: ParseAmountError) -> Self {
        match err {
            ParseAmountError::InvalidNumber(input) => AccountError::InvalidNumber(input),
        }
    }
}

impl From<BalanceError> for AccountError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::NonPositiveAmount(amount) => AccountError::NonPositiveAmount(amount),
            BalanceError::Insufficient { balance, requested } => {
                AccountError::InsufficientBalance { balance, requested }
            }
            BalanceError::Overflow { balance, amount } => {
                AccountError::BalanceOverflow { balance, amount }
            }
        }
    }
}
