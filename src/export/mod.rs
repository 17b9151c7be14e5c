//! Transfer format and the pure import/export reconciliation engine.
//!
//! This module provides:
//! - The `{ "projects": [...] }` transfer envelope used for export and import
//! - Project diffing (`diff`)
//! - Classification of an incoming batch against the current one (`classify`)
//! - Keep-local merging (`merge`)
//!
//! Nothing here touches the record store; see `db::import` for that.

pub mod classify;
pub mod diff;
pub mod merge;

use crate::error::{Error, Result};
use crate::types::{Dataset, EnvironmentData, Project, now_iso};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Gzip stream magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// File name prefix for exports.
pub const EXPORT_FILE_PREFIX: &str = "db_export_";

/// File name used for the template download.
pub const TEMPLATE_FILE_NAME: &str = "db_template.json";

/// The transfer envelope for import and export files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFile {
    pub projects: Vec<Project>,
}

impl TransferFile {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Parse transfer bytes (plain JSON or gzip-compressed JSON).
    ///
    /// Fails with `Error::Parse` when the bytes are not JSON and with
    /// `Error::Schema` when the top level is not an object carrying a
    /// `projects` array of project records.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let decompressed;
        let bytes = if bytes.starts_with(&GZIP_MAGIC) {
            let mut buf = Vec::new();
            flate2::read::GzDecoder::new(bytes)
                .read_to_end(&mut buf)
                .map_err(|e| Error::Parse(format!("corrupt gzip stream: {}", e)))?;
            decompressed = buf;
            decompressed.as_slice()
        } else {
            bytes
        };

        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| Error::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parse transfer text.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(mut value: Value) -> Result<Self> {
        let Some(obj) = value.as_object_mut() else {
            return Err(Error::Schema(
                "top-level value must be an object".to_string(),
            ));
        };
        let projects = match obj.remove("projects") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(Error::Schema("`projects` must be an array".to_string()));
            }
            None => return Err(Error::Schema("missing `projects` array".to_string())),
        };

        let projects = projects
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<Project>(item)
                    .map_err(|e| Error::Schema(format!("projects[{}]: {}", i, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { projects })
    }

    /// Load a transfer file from disk (supports both plain JSON and gzip).
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_slice(&bytes)
    }

    /// Serialize with 2-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Illustrative single-project file with two environments and no tests.
    pub fn template() -> Self {
        let environments = vec!["Environment 1".to_string(), "Environment 2".to_string()];
        let data: EnvironmentData = environments
            .iter()
            .map(|env| {
                let dataset: Dataset = [("key".to_string(), "value".to_string())]
                    .into_iter()
                    .collect();
                (env.clone(), dataset)
            })
            .collect();

        Self {
            projects: vec![Project {
                id: "template-project-id".to_string(),
                name: "Project Name".to_string(),
                environments,
                data,
                tests: Vec::new(),
                created_at: now_iso(),
            }],
        }
    }

    /// Ids of projects that appear more than once in this file.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for project in &self.projects {
            if !seen.insert(project.id.as_str()) && !duplicates.contains(&project.id.as_str()) {
                duplicates.push(project.id.as_str());
            }
        }
        duplicates
    }
}

/// Calendar day used in export file names: the UTC date of `instant`.
pub fn export_date<Tz: chrono::TimeZone>(instant: &chrono::DateTime<Tz>) -> chrono::NaiveDate {
    instant.with_timezone(&chrono::Utc).date_naive()
}

/// Default export file name for a given day, e.g. `db_export_2024-01-31.json`.
pub fn export_file_name(date: chrono::NaiveDate) -> String {
    format!("{}{}.json", EXPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const SAMPLE: &str = r#"{"projects":[{"id":"p1","name":"Demo","environments":["QA"],"data":{"QA":{"host":"a"}},"tests":[],"createdAt":"2024-01-01T00:00:00Z"}]}"#;

    #[test]
    fn test_parse_sample() {
        let file = TransferFile::from_json(SAMPLE).unwrap();
        assert_eq!(file.projects.len(), 1);
        assert_eq!(file.projects[0].id, "p1");
        assert_eq!(file.projects[0].created_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = TransferFile::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_shape_errors_are_schema_errors() {
        for input in [
            "[]",
            "42",
            r#"{"items": []}"#,
            r#"{"projects": {"id": "p1"}}"#,
            r#"{"projects": null}"#,
            r#"{"projects": [{"name": "no id"}]}"#,
        ] {
            let err = TransferFile::from_json(input).unwrap_err();
            assert!(matches!(err, Error::Schema(_)), "input: {}", input);
        }
    }

    #[test]
    fn test_schema_error_names_offending_index() {
        let err = TransferFile::from_json(r#"{"projects": [{"id": "a", "name": "A"}, 7]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("projects[1]"));
    }

    #[test]
    fn test_empty_projects_is_valid() {
        let file = TransferFile::from_json(r#"{"projects": []}"#).unwrap();
        assert!(file.projects.is_empty());
    }

    #[test]
    fn test_gzip_input() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let bytes = encoder.finish().unwrap();

        let file = TransferFile::from_slice(&bytes).unwrap();
        assert_eq!(file.projects[0].name, "Demo");
    }

    #[test]
    fn test_truncated_gzip_is_parse_error() {
        let err = TransferFile::from_slice(&[0x1f, 0x8b, 0x08]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_pretty_output_uses_two_spaces() {
        let file = TransferFile::from_json(SAMPLE).unwrap();
        let json = file.to_json_pretty().unwrap();
        assert!(json.starts_with("{\n  \"projects\": [\n    {"));
        assert_eq!(TransferFile::from_json(&json).unwrap(), file);
    }

    #[test]
    fn test_template_shape() {
        let template = TransferFile::template();
        assert_eq!(template.projects.len(), 1);
        let project = &template.projects[0];
        assert_eq!(project.environments.len(), 2);
        assert!(project.tests.is_empty());
        for env in &project.environments {
            assert_eq!(project.data[env]["key"], "value");
        }

        let json = template.to_json_pretty().unwrap();
        assert_eq!(TransferFile::from_json(&json).unwrap(), template);
    }

    #[test]
    fn test_duplicate_ids() {
        let file = TransferFile::from_json(
            r#"{"projects": [
                {"id": "a", "name": "A"},
                {"id": "b", "name": "B"},
                {"id": "a", "name": "A2"},
                {"id": "a", "name": "A3"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(file.duplicate_ids(), vec!["a"]);
    }

    #[test]
    fn test_export_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(export_file_name(date), "db_export_2024-01-31.json");
    }

    #[test]
    fn test_export_date_uses_utc_day() {
        // Late evening west of Greenwich is already the next day in UTC
        let instant = chrono::DateTime::parse_from_rfc3339("2024-03-09T23:30:00-05:00").unwrap();
        assert_eq!(
            export_file_name(export_date(&instant)),
            "db_export_2024-03-10.json"
        );

        let instant = chrono::DateTime::parse_from_rfc3339("2024-03-10T00:30:00+02:00").unwrap();
        assert_eq!(
            export_file_name(export_date(&instant)),
            "db_export_2024-03-09.json"
        );
    }
}
