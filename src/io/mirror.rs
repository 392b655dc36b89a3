use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::Mirror;
use crate::domain::{Snapshot, TransactionKind, format_timestamp, parse_timestamp};

pub const MIRROR_HEADER: [&str; 4] = ["Timestamp", "Kind", "Amount", "Balance"];

/// Spreadsheet copy of the ledger: a CSV file with one row per transaction
/// and the balance it left behind.
#[derive(Debug, Clone)]
pub struct SpreadsheetMirror {
    path: PathBuf,
}

impl SpreadsheetMirror {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Point at `path`, writing the header row if the file is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mirror = Self::new(path);
        mirror.write_rows(&[])?;
        Ok(mirror)
    }

    /// Append `rows`, creating the file with its header first when it is
    /// absent or empty.
    fn write_rows(&self, rows: &[&Snapshot]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open mirror {}", self.path.display()))?;
        let is_empty = file
            .metadata()
            .with_context(|| format!("Failed to stat mirror {}", self.path.display()))?
            .len()
            == 0;

        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            debug!(path = %self.path.display(), "creating spreadsheet mirror");
            csv_writer.write_record(MIRROR_HEADER)?;
        }

        for row in rows {
            csv_writer.write_record(&[
                format_timestamp(row.timestamp),
                row.kind.label().to_string(),
                row.amount.to_string(),
                row.balance.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Read every data row back, skipping the header.
    pub fn read_rows(&self) -> Result<Vec<Snapshot>> {
        let mut csv_reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to read mirror {}", self.path.display()))?;

        let mut rows = Vec::new();
        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing
            let record = result.with_context(|| format!("Mirror line {}", line))?;

            let field = |i: usize| record.get(i).unwrap_or("");
            let kind_str = field(1);

            rows.push(Snapshot {
                timestamp: parse_timestamp(field(0))
                    .with_context(|| format!("Mirror line {}: invalid timestamp", line))?,
                kind: TransactionKind::from_str(kind_str).ok_or_else(|| {
                    anyhow::anyhow!("Mirror line {}: invalid kind '{}'", line, kind_str)
                })?,
                amount: field(2)
                    .parse()
                    .with_context(|| format!("Mirror line {}: invalid amount", line))?,
                balance: field(3)
                    .parse()
                    .with_context(|| format!("Mirror line {}: invalid balance", line))?,
            });
        }

        Ok(rows)
    }

    /// Number of data rows, or `None` when the file doesn't exist.
    pub fn count_rows(&self) -> Result<Option<usize>> {
        match fs::metadata(&self.path) {
            Ok(_) => Ok(Some(self.read_rows()?.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to stat mirror {}", self.path.display())),
        }
    }
}

impl Mirror for SpreadsheetMirror {
    fn append_row(&self, row: &Snapshot) -> Result<()> {
        self.write_rows(&[row])
    }
}
