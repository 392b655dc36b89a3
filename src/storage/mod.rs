mod repository;

pub use repository::*;

/// SQL for the initial schema. Every statement is idempotent, so it runs on
/// each open.
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
