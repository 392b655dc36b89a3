use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "finance.db";
pub const DEFAULT_MIRROR: &str = "riwayat_transaksi.csv";
pub const DEFAULT_ACTIVITY_LOG: &str = "logs.txt";

/// Where the three stores live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub mirror: PathBuf,
    pub activity_log: PathBuf,
}

impl Config {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            database: dir.join(DEFAULT_DATABASE),
            mirror: dir.join(DEFAULT_MIRROR),
            activity_log: dir.join(DEFAULT_ACTIVITY_LOG),
        }
    }

    /// Default file names inside `dir`, each optionally replaced. Relative
    /// overrides are resolved against `dir`, absolute ones are kept as is.
    pub fn resolve(
        dir: impl AsRef<Path>,
        database: Option<PathBuf>,
        mirror: Option<PathBuf>,
        activity_log: Option<PathBuf>,
    ) -> Self {
        let dir = dir.as_ref();
        let defaults = Self::in_dir(dir);
        Self {
            database: database.map_or(defaults.database, |p| dir.join(p)),
            mirror: mirror.map_or(defaults.mirror, |p| dir.join(p)),
            activity_log: activity_log.map_or(defaults.activity_log, |p| dir.join(p)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::in_dir(".")
    }
}
