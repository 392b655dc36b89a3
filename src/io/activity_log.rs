use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ActivityLog;

/// Append-only text file, one line per recorded transaction.
#[derive(Debug, Clone)]
pub struct ActivityLogFile {
    path: PathBuf,
}

impl ActivityLogFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// All lines written so far. A missing file reads as empty.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read activity log {}", self.path.display()))?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

impl ActivityLog for ActivityLogFile {
    fn record(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open activity log {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write activity log {}", self.path.display()))?;
        Ok(())
    }
}
