//! Import subcommand for testdoc CLI
//!
//! Imports projects from a transfer file into the database, either
//! overwriting the stored collection or merging into it.

use crate::db::import::ImportMode;
use crate::format::OutputFormat;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the transfer file to import (plain or gzipped JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Merge mode: keep stored projects on id collisions, add new
    /// projects and tests
    #[arg(long, conflicts_with = "overwrite")]
    pub merge: bool,

    /// Overwrite mode: replace every stored project with the file content
    #[arg(long)]
    pub overwrite: bool,

    /// Report what the import would do without modifying the database
    #[arg(long)]
    pub dry_run: bool,

    /// Output format: text (default), json, or summary
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,
}

/// What the import command should do after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    Apply(ImportMode),
    /// Conflicts found and no resolution chosen
    NeedsResolution,
}

impl ImportArgs {
    /// Mode chosen on the command line, if any
    pub fn explicit_mode(&self) -> Option<ImportMode> {
        if self.overwrite {
            Some(ImportMode::Overwrite)
        } else if self.merge {
            Some(ImportMode::Merge)
        } else {
            None
        }
    }

    /// Resolve the mode to apply.
    ///
    /// An explicit flag always wins. Without one, a conflict-free import uses
    /// the configured default and a conflicting one stops for a decision.
    pub fn decide(&self, has_conflicts: bool, default_mode: ImportMode) -> ImportDecision {
        match self.explicit_mode() {
            Some(mode) => ImportDecision::Apply(mode),
            None if has_conflicts => ImportDecision::NeedsResolution,
            None => ImportDecision::Apply(default_mode),
        }
    }
}
