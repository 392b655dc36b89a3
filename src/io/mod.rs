// File-backed sinks and exports

mod activity_log;
pub mod export;
mod mirror;

pub use activity_log::*;
pub use mirror::*;
