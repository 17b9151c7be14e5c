//! CLI command definitions for testdoc
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod diff;
pub mod export;
pub mod import;
pub mod template;

use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand};
use diff::DiffArgs;
use export::ExportArgs;
use import::ImportArgs;
use template::TemplateArgs;

/// Test documentation store with JSON export, import and merge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export every project to a JSON transfer file
    Export(ExportArgs),

    /// Import projects from a transfer file
    Import(ImportArgs),

    /// Compare a transfer file against the database or another file
    Diff(DiffArgs),

    /// Write an example transfer file
    Template(TemplateArgs),

    /// List stored projects
    Projects(ProjectsArgs),
}

/// Arguments for the projects subcommand
#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Output format: text (default), json, or summary
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,
}
