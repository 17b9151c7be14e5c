//! testdoc command line
//!
//! Export, import, diff and inspect the stored test documentation projects.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use testdoc::cli::diff::DiffArgs;
use testdoc::cli::export::{ExportArgs, gz_path};
use testdoc::cli::import::{ImportArgs, ImportDecision};
use testdoc::cli::template::TemplateArgs;
use testdoc::cli::{Cli, Command, ProjectsArgs};
use testdoc::config::Config;
use testdoc::db::export::{encode_transfer, export_projects};
use testdoc::db::import::prepare_import;
use testdoc::db::{Database, ProjectStore};
use testdoc::error::Error;
use testdoc::export::{TransferFile, export_date};
use testdoc::format::{
    ComparisonReport, OutputFormat, format_dry_run, format_import_report, format_projects,
};
use testdoc::logging::{self, LogTarget};
use tracing::{debug, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(e) => eprintln!("Error [{}]: {}", e.code().as_str(), e),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let target: LogTarget = cli.log.parse().map_err(anyhow::Error::msg)?;
    logging::init(&target, cli.verbose)?;

    let mut config = Config::load_or_default(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.into();
    }
    debug!(db_path = %config.store.db_path.display(), "configuration loaded");

    match cli.command {
        Command::Export(args) => run_export(&config, args),
        Command::Import(args) => run_import(&config, args),
        Command::Diff(args) => run_diff(&config, args),
        Command::Template(args) => run_template(args),
        Command::Projects(args) => run_projects(&config, args),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    Ok(Database::open(&config.store.db_path)?)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Run the export command
fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let db = open_database(config)?;
    let file = export_projects(&db)?;

    let plain = encode_transfer(&file, false)?;
    let destination = args.destination(&config.export, export_date(&chrono::Utc::now()));
    let compress = args.should_compress(
        destination.as_deref(),
        Some(plain.len() as u64),
        &config.export,
    );
    let bytes = if compress {
        encode_transfer(&file, true)?
    } else {
        plain
    };

    match destination {
        Some(path) => {
            let path = if compress { gz_path(&path) } else { path };
            write_file(&path, &bytes)?;
            info!(projects = file.projects.len(), path = %path.display(), "export written");
            eprintln!(
                "Exported {} project(s) to {}{}",
                file.projects.len(),
                path.display(),
                if compress { " (gzipped)" } else { "" }
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&bytes)?;
            if !compress {
                writeln!(out)?;
            }
        }
    }

    Ok(())
}

/// Run the import command
fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file).map_err(|e| Error::io(&args.file, e))?;
    let db = open_database(config)?;

    let pending = prepare_import(&db, &bytes)?;

    if args.dry_run {
        let mode = args.explicit_mode().unwrap_or(config.import.default_mode);
        let preview = pending.preview(&db, mode)?;
        print!("{}", format_dry_run(&preview, args.format)?);
        if args.format == OutputFormat::Text {
            for diff in pending.classification.diffs() {
                print!("{}", diff);
            }
        }
        return Ok(());
    }

    let mode = match args.decide(pending.has_conflicts(), config.import.default_mode) {
        ImportDecision::Apply(mode) => mode,
        ImportDecision::NeedsResolution => {
            let current = db.get_all()?;
            let report = ComparisonReport::build(
                args.file.display().to_string(),
                "database",
                &pending.incoming.projects,
                &current,
            );
            print!("{}", report.render(args.format)?);
            anyhow::bail!(
                "{} conflicting project(s). Use --merge to keep local content or --overwrite to replace it.",
                pending.classification.conflicting_projects.len()
            );
        }
    };

    let report = pending.apply(&db, mode)?;
    print!("{}", format_import_report(&report, args.format)?);
    Ok(())
}

/// Run the diff command
fn run_diff(config: &Config, args: DiffArgs) -> Result<()> {
    let source = TransferFile::from_file(&args.source)?;

    let target = match &args.target {
        Some(path) => TransferFile::from_file(path)?.projects,
        None => open_database(config)?.get_all()?,
    };

    let mut report = ComparisonReport::build(
        args.source.display().to_string(),
        args.target_label(),
        &source.projects,
        &target,
    );
    if let Some(id) = &args.project {
        report.retain_project(id);
    }

    print!("{}", report.render(args.format)?);
    Ok(())
}

/// Run the template command
fn run_template(args: TemplateArgs) -> Result<()> {
    let json = TransferFile::template().to_json_pretty()?;

    match args.destination() {
        Some(path) => {
            write_file(&path, json.as_bytes())?;
            eprintln!("Template written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Run the projects command
fn run_projects(config: &Config, args: ProjectsArgs) -> Result<()> {
    let db = open_database(config)?;
    let projects = db.get_all()?;
    print!("{}", format_projects(&projects, args.format)?);
    Ok(())
}
