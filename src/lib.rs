//! Tiered backup rotation for qBittorrent instance directories.
//!
//! Builds one compressed archive per instance per run and distributes it
//! into calendar-aligned retention tiers (hourly/daily/weekly/monthly),
//! pruning each tier to a bounded archive count.

pub mod archive;
pub mod config;
pub mod instance;
pub mod mount;
pub mod orchestrator;
pub mod rotate;
pub mod schedule;
pub mod tier;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::RotatorError;
pub type Result<T> = std::result::Result<T, RotatorError>;
