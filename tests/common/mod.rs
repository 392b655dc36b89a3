// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use celengan::application::LocalAccount;
use celengan::config::Config;
use celengan::io::{ActivityLogFile, SpreadsheetMirror};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

/// Helper to open an account whose stores all live in a temporary directory
pub async fn test_account() -> Result<(LocalAccount, Config, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = Config::in_dir(temp_dir.path());
    let account = LocalAccount::open_local(&config).await?;
    Ok((account, config, temp_dir))
}

/// Reopen the stores named by `config`, as a fresh process would
pub async fn reopen(config: &Config) -> Result<LocalAccount> {
    Ok(LocalAccount::open_local(config).await?)
}

pub fn mirror_rows(config: &Config) -> Result<Vec<celengan::Snapshot>> {
    SpreadsheetMirror::new(&config.mirror).read_rows()
}

pub fn log_lines(config: &Config) -> Result<Vec<String>> {
    ActivityLogFile::new(&config.activity_log).read_lines()
}

/// Helper to build a timestamp on a fixed day
pub fn at(date_str: &str, hour: u32) -> NaiveDateTime {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}
