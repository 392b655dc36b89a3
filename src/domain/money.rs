use std::fmt;

/// Money is a whole number of Rupiah. There is no fractional unit.
pub type Rupiah = i64;

/// Format an amount for people: dot thousands separators, "Rp" prefix.
/// Example: 1250000 -> "Rp1.250.000", -500 -> "-Rp500"
///
/// Accepts ledger totals as well, which may be wider than a `Rupiah`.
pub fn format_rupiah(amount: impl Into<i128>) -> String {
    let amount: i128 = amount.into();
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}Rp{}", sign, grouped)
}

/// Parse user input as an integer amount.
/// Surrounding whitespace is ignored and a leading sign is accepted, so
/// "-5" parses (and is later rejected as non-positive) while "abc" or "1.5"
/// do not parse at all.
pub fn parse_amount(input: &str) -> Result<Rupiah, ParseAmountError> {
    let trimmed = input.trim();
    trimmed
        .parse::<Rupiah>()
        .map_err(|_| ParseAmountError::InvalidNumber(trimmed.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidNumber(String),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidNumber(input) => {
                write!(f, "'{}' is not a valid whole number", input)
            }
        }
    }
}

impl std::error::Error for ParseAmountError {}
