//! Template subcommand for testdoc CLI
//!
//! Writes an example transfer file showing the expected shape.

use crate::export::TEMPLATE_FILE_NAME;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the template subcommand
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Output file path (default: db_template.json, "-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl TemplateArgs {
    /// Destination file, or None for stdout
    pub fn destination(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(TEMPLATE_FILE_NAME)),
        }
    }
}
