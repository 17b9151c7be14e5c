//! Diff subcommand for testdoc CLI
//!
//! Compares a transfer file against the database or another file.

use crate::format::OutputFormat;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the diff subcommand
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Transfer file with the incoming projects
    #[arg(value_name = "FILE")]
    pub source: PathBuf,

    /// Second transfer file (optional, compares source against database if not provided)
    #[arg(value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// Output format: text (default), json, or summary
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Only show changes for one project id
    #[arg(long, value_name = "ID")]
    pub project: Option<String>,
}

impl DiffArgs {
    /// Check if we're comparing two files or file vs database
    pub fn is_two_file_diff(&self) -> bool {
        self.target.is_some()
    }

    /// Label for the target side of the comparison
    pub fn target_label(&self) -> String {
        match &self.target {
            Some(path) => path.display().to_string(),
            None => "database".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_label() {
        let args = DiffArgs {
            source: PathBuf::from("a.json"),
            target: None,
            format: OutputFormat::Text,
            project: None,
        };
        assert!(!args.is_two_file_diff());
        assert_eq!(args.target_label(), "database");

        let args = DiffArgs {
            target: Some(PathBuf::from("b.json")),
            ..args
        };
        assert!(args.is_two_file_diff());
        assert_eq!(args.target_label(), "b.json");
    }
}
