//! Keep-local merging of an incoming project batch into the current one.
//!
//! - Projects: insert if the id is new, otherwise keep the local version's
//!   name, environments and data
//! - Tests: append incoming tests whose id is unknown locally, at the end;
//!   existing tests are never touched

use crate::types::Project;
use std::collections::{HashMap, HashSet};

/// Counters describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Incoming projects adopted as-is
    pub projects_added: usize,
    /// Incoming projects whose id already existed locally
    pub projects_matched: usize,
    /// Tests appended to existing projects
    pub tests_added: usize,
    /// Incoming tests skipped because the local project already had the id
    pub tests_kept_local: usize,
}

/// Merged collection plus counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub projects: Vec<Project>,
    pub stats: MergeStats,
}

/// Merge `incoming` into `current`, keeping local content on id collisions.
///
/// Output order: current projects in their original order, followed by
/// new incoming projects in input order.
pub fn merge_projects(current: &[Project], incoming: &[Project]) -> Vec<Project> {
    merge_with_stats(current, incoming).projects
}

/// Same as [`merge_projects`], also reporting what was added.
pub fn merge_with_stats(current: &[Project], incoming: &[Project]) -> MergeOutcome {
    let mut merged: Vec<Project> = Vec::with_capacity(current.len() + incoming.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for project in current {
        // A repeated local id keeps its first position and its last content
        match index.get(&project.id) {
            Some(&pos) => merged[pos] = project.clone(),
            None => {
                index.insert(project.id.clone(), merged.len());
                merged.push(project.clone());
            }
        }
    }

    let mut stats = MergeStats::default();

    for project in incoming {
        let Some(&pos) = index.get(&project.id) else {
            index.insert(project.id.clone(), merged.len());
            merged.push(project.clone());
            stats.projects_added += 1;
            continue;
        };

        stats.projects_matched += 1;
        let existing = &mut merged[pos];
        // Index of the local tests only; incoming tests never join it
        let known: HashSet<String> = existing.tests.iter().map(|t| t.id.clone()).collect();

        for test in &project.tests {
            if !known.contains(&test.id) {
                existing.tests.push(test.clone());
                stats.tests_added += 1;
            } else {
                stats.tests_kept_local += 1;
            }
        }
    }

    MergeOutcome {
        projects: merged,
        stats,
    }
}
