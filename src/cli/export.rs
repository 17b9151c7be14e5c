//! Export subcommand for testdoc CLI
//!
//! Exports every stored project to the JSON transfer format, which can be
//! version-controlled, diffed, and re-imported.

use crate::config::ExportConfig;
use crate::export::export_file_name;
use chrono::NaiveDate;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path ("-" for stdout, default: db_export_<date>.json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force gzip compression (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,

    /// Automatically compress if output exceeds this size
    ///
    /// Accepts human-readable sizes: 100KB, 1MB, etc.
    /// If the uncompressed output exceeds this threshold, the output
    /// will be gzip compressed (and .gz appended to filename if needed).
    #[arg(long, value_name = "SIZE")]
    pub compress_threshold: Option<String>,
}

impl ExportArgs {
    /// Where to write the export, or None for stdout.
    ///
    /// Without `--output` the dated default name is used, inside the
    /// configured output directory when one is set.
    pub fn destination(&self, defaults: &ExportConfig, today: NaiveDate) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => {
                let name = export_file_name(today);
                Some(match &defaults.output_dir {
                    Some(dir) => dir.join(name),
                    None => PathBuf::from(name),
                })
            }
        }
    }

    /// Parse the compress threshold into bytes, falling back to the config
    pub fn compress_threshold_bytes(&self, defaults: &ExportConfig) -> Option<u64> {
        self.compress_threshold
            .as_deref()
            .or(defaults.compress_threshold.as_deref())
            .and_then(parse_size)
    }

    /// Determine if output should be compressed based on args and filename
    pub fn should_compress(
        &self,
        path: Option<&Path>,
        output_size: Option<u64>,
        defaults: &ExportConfig,
    ) -> bool {
        // Explicit --gzip flag always wins
        if self.gzip || defaults.gzip {
            return true;
        }

        if let Some(path) = path
            && path.extension().is_some_and(|ext| ext == "gz")
        {
            return true;
        }

        if let (Some(threshold), Some(size)) = (self.compress_threshold_bytes(defaults), output_size)
        {
            return size > threshold;
        }

        false
    }
}

/// Append `.gz` unless the path already carries it.
pub fn gz_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "gz") {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Parse a human-readable size string into bytes
///
/// Supports: B, KB, MB, GB (case-insensitive). Sizes that overflow `u64`
/// are rejected.
fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();

    let (num, multiplier) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = s.strip_suffix('B') {
        (num, 1)
    } else {
        (s.as_str(), 1)
    };

    num.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output: Option<&str>, gzip: bool, threshold: Option<&str>) -> ExportArgs {
        ExportArgs {
            output: output.map(PathBuf::from),
            gzip,
            compress_threshold: threshold.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100"), Some(100));
        assert_eq!(parse_size("100B"), Some(100));
        assert_eq!(parse_size("100kb"), Some(100 * 1024));
        assert_eq!(parse_size("1MB"), Some(1024 * 1024));
        assert_eq!(parse_size("1GB"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size("invalid"), None);
    }

    #[test]
    fn test_parse_size_overflow_is_rejected() {
        assert_eq!(parse_size("99999999999GB"), None);
        assert_eq!(parse_size("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_size("18446744073709551615KB"), None);

        let a = args(None, false, Some("99999999999GB"));
        assert!(!a.should_compress(None, Some(u64::MAX), &ExportConfig::default()));
    }

    #[test]
    fn test_destination() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let defaults = ExportConfig::default();

        assert_eq!(
            args(None, false, None).destination(&defaults, today),
            Some(PathBuf::from("db_export_2024-03-09.json"))
        );
        assert_eq!(args(Some("-"), false, None).destination(&defaults, today), None);

        let defaults = ExportConfig {
            output_dir: Some(PathBuf::from("exports")),
            ..Default::default()
        };
        assert_eq!(
            args(None, false, None).destination(&defaults, today),
            Some(PathBuf::from("exports/db_export_2024-03-09.json"))
        );
    }

    #[test]
    fn test_should_compress() {
        let defaults = ExportConfig::default();

        assert!(args(None, true, None).should_compress(None, None, &defaults));
        assert!(args(None, false, None).should_compress(
            Some(Path::new("snapshot.json.gz")),
            None,
            &defaults
        ));

        let a = args(None, false, Some("100KB"));
        assert!(!a.should_compress(None, Some(50 * 1024), &defaults));
        assert!(a.should_compress(None, Some(150 * 1024), &defaults));

        let defaults = ExportConfig {
            compress_threshold: Some("1KB".to_string()),
            ..Default::default()
        };
        assert!(args(None, false, None).should_compress(None, Some(2048), &defaults));
    }

    #[test]
    fn test_gz_path() {
        assert_eq!(gz_path(Path::new("a.json")), PathBuf::from("a.json.gz"));
        assert_eq!(gz_path(Path::new("a.json.gz")), PathBuf::from("a.json.gz"));
    }
}
