//! testdoc library
//!
//! Project records for manual test documentation, with conflict-aware
//! import, keep-local merging and JSON export.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod types;
