//! Classification of an incoming project batch against the current one.

use super::diff::{ProjectDiff, compare_project};
use crate::types::Project;
use serde::Serialize;
use std::collections::HashMap;

/// An incoming project that shares its id with a current one but differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub current: Project,
    pub incoming: Project,
}

impl Conflict {
    pub fn diff(&self) -> ProjectDiff {
        compare_project(&self.current, &self.incoming)
    }
}

/// Incoming projects partitioned by how they relate to the current batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub new_projects: Vec<Project>,
    pub conflicting_projects: Vec<Conflict>,
    pub identical_projects: Vec<Project>,
}

impl ImportResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicting_projects.is_empty()
    }

    /// Number of incoming projects classified.
    pub fn total(&self) -> usize {
        self.new_projects.len() + self.conflicting_projects.len() + self.identical_projects.len()
    }

    /// Diffs for every conflicting pair, in incoming order.
    pub fn diffs(&self) -> Vec<ProjectDiff> {
        self.conflicting_projects.iter().map(Conflict::diff).collect()
    }
}

/// Partition `incoming` into new, identical and conflicting projects.
///
/// Current projects without an incoming counterpart are not reported.
pub fn detect_conflicts(current: &[Project], incoming: &[Project]) -> ImportResult {
    let by_id: HashMap<&str, &Project> = current.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut result = ImportResult::default();

    for project in incoming {
        match by_id.get(project.id.as_str()) {
            None => result.new_projects.push(project.clone()),
            Some(existing) if *existing == project => {
                result.identical_projects.push(project.clone())
            }
            Some(existing) => result.conflicting_projects.push(Conflict {
                current: (*existing).clone(),
                incoming: project.clone(),
            }),
        }
    }

    result
}
