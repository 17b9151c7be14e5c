//! Output formatting for command results.

use crate::db::import::{DryRunResult, ImportReport};
use crate::error::{Error, Result};
use crate::export::classify::detect_conflicts;
use crate::export::diff::ProjectDiff;
use crate::types::Project;
use serde::Serialize;
use std::collections::HashSet;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Summary,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "summary" => Ok(OutputFormat::Summary),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, json, summary",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Encode(e.to_string()))
}

/// One line of a project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub environments: Vec<String>,
    pub test_count: usize,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            environments: project.environments.clone(),
            test_count: project.tests.len(),
        }
    }
}

impl std::fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.name)?;
        if !self.environments.is_empty() {
            write!(f, " [{}]", self.environments.join(", "))?;
        }
        write!(f, " {} test(s)", self.test_count)
    }
}

/// Comparison of a source collection against a target collection.
///
/// The target plays the role of the stored collection: `added` are source
/// projects the target lacks, `only_in_target` the reverse.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub source: String,
    pub target: String,
    pub added: Vec<ProjectSummary>,
    pub conflicts: Vec<ProjectDiff>,
    pub identical: Vec<ProjectSummary>,
    pub only_in_target: Vec<ProjectSummary>,
}

impl ComparisonReport {
    pub fn build(
        source_label: impl Into<String>,
        target_label: impl Into<String>,
        source: &[Project],
        target: &[Project],
    ) -> Self {
        let classification = detect_conflicts(target, source);
        let source_ids: HashSet<&str> = source.iter().map(|p| p.id.as_str()).collect();

        Self {
            source: source_label.into(),
            target: target_label.into(),
            added: classification.new_projects.iter().map(ProjectSummary::from).collect(),
            conflicts: classification.diffs(),
            identical: classification
                .identical_projects
                .iter()
                .map(ProjectSummary::from)
                .collect(),
            only_in_target: target
                .iter()
                .filter(|p| !source_ids.contains(p.id.as_str()))
                .map(ProjectSummary::from)
                .collect(),
        }
    }

    /// Restrict the report to a single project id.
    pub fn retain_project(&mut self, id: &str) {
        self.added.retain(|p| p.id == id);
        self.conflicts.retain(|d| d.project_id == id);
        self.identical.retain(|p| p.id == id);
        self.only_in_target.retain(|p| p.id == id);
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.conflicts.is_empty() && self.only_in_target.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.conflicts.len() + self.only_in_target.len()
    }

    fn summary_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Diff: {} -> {}\n", self.source, self.target));
        if self.is_empty() {
            out.push_str("No differences found.\n");
            return out;
        }
        out.push_str(&format!(
            "  projects: +{} ~{} ={} only-in-target {}\n",
            self.added.len(),
            self.conflicts.len(),
            self.identical.len(),
            self.only_in_target.len()
        ));
        out.push_str(&format!("Total: {} changes\n", self.total_changes()));
        out
    }

    fn text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Diff: {} -> {}\n", self.source, self.target));
        out.push_str(&format!("{}\n", "=".repeat(40)));

        if self.is_empty() {
            out.push_str("No differences found.\n");
            return out;
        }

        if !self.added.is_empty() {
            out.push_str(&format!("New projects ({}):\n", self.added.len()));
            for project in &self.added {
                out.push_str(&format!("  + {}\n", project));
            }
        }

        if !self.conflicts.is_empty() {
            out.push_str(&format!(
                "Conflicting projects ({}):\n",
                self.conflicts.len()
            ));
            for diff in &self.conflicts {
                out.push_str(&diff.to_string());
            }
        }

        if !self.only_in_target.is_empty() {
            out.push_str(&format!(
                "Only in {} ({}):\n",
                self.target,
                self.only_in_target.len()
            ));
            for project in &self.only_in_target {
                out.push_str(&format!("  - {}\n", project));
            }
        }

        out.push_str(&format!("Identical projects: {}\n", self.identical.len()));
        out
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.text()),
            OutputFormat::Summary => Ok(self.summary_text()),
            OutputFormat::Json => to_json(self),
        }
    }
}

/// Render a dry-run preview.
pub fn format_dry_run(result: &DryRunResult, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(result);
    }

    let mut out = String::new();
    out.push_str("Dry run results:\n");
    out.push_str(&format!("  Mode: {}\n", result.mode.as_str()));
    out.push_str(&format!("  Existing projects: {}\n", result.existing_projects));
    out.push_str(&format!("  Resulting projects: {}\n", result.resulting_projects));
    out.push_str(&format!(
        "  Incoming: {} new, {} conflicting, {} identical\n",
        result.new_projects, result.conflicting_projects, result.identical_projects
    ));
    if result.tests_added > 0 {
        out.push_str(&format!("  Tests appended: {}\n", result.tests_added));
    }
    if format == OutputFormat::Text {
        if !result.conflicts.is_empty() {
            out.push_str(&format!("  Conflicts: {}\n", result.conflicts.join(", ")));
        }
        if !result.would_discard.is_empty() {
            out.push_str(&format!("  Would discard: {}\n", result.would_discard.join(", ")));
        }
    }
    if !result.warnings.is_empty() {
        out.push_str("  Warnings:\n");
        for warning in &result.warnings {
            out.push_str(&format!("    - {}\n", warning));
        }
    }
    Ok(out)
}

/// Render the outcome of an applied import.
pub fn format_import_report(report: &ImportReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    out.push_str("Import complete:\n");
    out.push_str(&format!("  Mode: {}\n", report.mode.as_str()));
    out.push_str(&format!(
        "  Projects: {} removed, {} written\n",
        report.projects_removed, report.projects_written
    ));
    out.push_str(&format!(
        "  Incoming: {} new, {} conflicting, {} identical\n",
        report.new_projects, report.conflicting_projects, report.identical_projects
    ));
    if report.tests_added > 0 {
        out.push_str(&format!("  Tests appended: {}\n", report.tests_added));
    }
    if format == OutputFormat::Text && !report.discarded.is_empty() {
        out.push_str(&format!("  Discarded: {}\n", report.discarded.join(", ")));
    }
    Ok(out)
}

/// Render a project listing.
pub fn format_projects(projects: &[Project], format: OutputFormat) -> Result<String> {
    let summaries: Vec<ProjectSummary> = projects.iter().map(ProjectSummary::from).collect();
    match format {
        OutputFormat::Json => to_json(&summaries),
        OutputFormat::Summary => Ok(format!("{} project(s)\n", summaries.len())),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Projects ({}):\n", summaries.len()));
            for summary in &summaries {
                out.push_str(&format!("  {}\n", summary));
            }
            Ok(out)
        }
    }
}
