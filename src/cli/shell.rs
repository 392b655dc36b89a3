use std::io::{BufRead, Write};

use anyhow::Result;

use crate::application::LocalAccount;
use crate::domain::{TransactionKind, format_rupiah, format_timestamp};

use super::receipt_message;

/// Transactions shown by the `history` action.
const SHELL_HISTORY_LIMIT: usize = 10;

const HELP: &str = "\
Actions:
  deposit <amount>    put money in (alias: d)
  withdraw <amount>   take money out (alias: w)
  balance             show the balance
  history             show the last transactions
  help                show this list
  quit                close (aliases: exit, close)";

/// One line typed into the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Deposit or withdrawal with the raw amount text, validated later
    Apply(TransactionKind, String),
    Balance,
    History,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "deposit" | "d" => ShellCommand::Apply(TransactionKind::Deposit, rest.to_string()),
            "withdraw" | "w" => ShellCommand::Apply(TransactionKind::Withdrawal, rest.to_string()),
            "balance" | "b" => ShellCommand::Balance,
            "history" | "h" => ShellCommand::History,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "close" | "q" => ShellCommand::Quit,
            _ => ShellCommand::Unknown(verb.to_string()),
        }
    }
}

/// Interactive session: read one action per line, apply it, refresh the
/// balance. Rejected input is reported and the session continues; storage
/// failures end it. End of input closes the session.
pub async fn run_shell<R: BufRead, W: Write>(
    account: &mut LocalAccount,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "Celengan - your piggy bank")?;
    writeln!(output, "Balance: {}", format_rupiah(account.balance()))?;
    writeln!(output, "Type 'help' for the list of actions.")?;

    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };

        match ShellCommand::parse(&line?) {
            ShellCommand::Apply(kind, amount) => match account.apply(kind, &amount).await {
                Ok(receipt) => {
                    writeln!(output, "{}", receipt_message(&receipt))?;
                    writeln!(output, "Balance: {}", format_rupiah(receipt.balance))?;
                }
                Err(err) if err.is_rejection() => {
                    writeln!(output, "Error: {}", err)?;
                }
                Err(err) => return Err(err.into()),
            },
            ShellCommand::Balance => {
                writeln!(output, "Balance: {}", format_rupiah(account.balance()))?;
            }
            ShellCommand::History => {
                let transactions = account.history(Some(SHELL_HISTORY_LIMIT)).await?;
                if transactions.is_empty() {
                    writeln!(output, "No transactions yet.")?;
                }
                for tx in &transactions {
                    writeln!(
                        output,
                        "{} | {} | {}",
                        format_timestamp(tx.timestamp),
                        tx.kind.label(),
                        format_rupiah(tx.amount)
                    )?;
                }
            }
            ShellCommand::Help => writeln!(output, "{}", HELP)?,
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
            ShellCommand::Unknown(verb) => {
                writeln!(output, "Unknown action '{}'. Type 'help'.", verb)?;
            }
        }
    }

    writeln!(output, "Goodbye. Final balance: {}", format_rupiah(account.balance()))?;
    Ok(())
}
