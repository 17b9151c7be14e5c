//! Import functionality for the project store.
//!
//! Import runs in two steps so the caller can decide how conflicts are
//! resolved:
//! 1. `prepare_import` parses the transfer bytes and classifies every
//!    incoming project against the persisted collection
//! 2. `PendingImport::apply` performs the chosen resolution:
//!    - Overwrite: replace the whole collection with the incoming projects
//!    - Merge: keep local content on id collisions, add what is new
//!
//! Both resolutions write through `ProjectStore::replace_all`, so the store
//! ends up either fully old or fully new.

use super::store::ProjectStore;
use crate::error::Result;
use crate::export::TransferFile;
use crate::export::classify::{ImportResult, detect_conflicts};
use crate::export::merge::merge_with_stats;
use crate::types::Project;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// How an import resolves the incoming collection against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Discard the stored collection and store the incoming one verbatim.
    Overwrite,
    /// Keep stored content on id collisions and add new projects and tests.
    #[default]
    Merge,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Overwrite => "overwrite",
            ImportMode::Merge => "merge",
        }
    }
}

/// Preview of an import. Nothing is written.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunResult {
    pub mode: ImportMode,
    /// Projects currently stored
    pub existing_projects: usize,
    /// Projects the store would hold afterwards
    pub resulting_projects: usize,
    pub new_projects: usize,
    pub conflicting_projects: usize,
    pub identical_projects: usize,
    /// Tests that would be appended to existing projects (merge)
    pub tests_added: usize,
    /// Ids of stored projects the import would drop (overwrite)
    pub would_discard: Vec<String>,
    /// Ids of conflicting projects whose incoming content would be ignored (merge)
    /// or would replace the stored version (overwrite)
    pub conflicts: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of an applied import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub mode: ImportMode,
    /// Rows removed by the replace step
    pub projects_removed: usize,
    /// Rows written by the replace step
    pub projects_written: usize,
    pub new_projects: usize,
    pub conflicting_projects: usize,
    pub identical_projects: usize,
    pub tests_added: usize,
    pub discarded: Vec<String>,
}

/// A parsed and classified import waiting for a resolution.
#[derive(Debug, Clone)]
pub struct PendingImport {
    pub incoming: TransferFile,
    pub classification: ImportResult,
}

/// Collection resolved for a mode, plus what it would change.
struct Resolution {
    projects: Vec<Project>,
    tests_added: usize,
    discarded: Vec<String>,
}

/// Parse transfer bytes and classify them against the stored collection.
///
/// Fails with a parse or schema error before the store is read; the store is
/// never written here.
pub fn prepare_import<S: ProjectStore + ?Sized>(store: &S, bytes: &[u8]) -> Result<PendingImport> {
    let incoming = TransferFile::from_slice(bytes)?;
    prepare_transfer(store, incoming)
}

/// Classify an already-parsed transfer file against the stored collection.
pub fn prepare_transfer<S: ProjectStore + ?Sized>(
    store: &S,
    incoming: TransferFile,
) -> Result<PendingImport> {
    let current = store.get_all()?;
    let classification = detect_conflicts(&current, &incoming.projects);

    info!(
        new = classification.new_projects.len(),
        conflicting = classification.conflicting_projects.len(),
        identical = classification.identical_projects.len(),
        "classified import"
    );

    Ok(PendingImport {
        incoming,
        classification,
    })
}

/// Parse, classify and apply in one call.
pub fn import_bytes<S: ProjectStore + ?Sized>(
    store: &S,
    bytes: &[u8],
    mode: ImportMode,
) -> Result<ImportReport> {
    prepare_import(store, bytes)?.apply(store, mode)
}

impl PendingImport {
    pub fn has_conflicts(&self) -> bool {
        self.classification.has_conflicts()
    }

    fn conflict_ids(&self) -> Vec<String> {
        self.classification
            .conflicting_projects
            .iter()
            .map(|c| c.incoming.id.clone())
            .collect()
    }

    fn resolve(&self, current: &[Project], mode: ImportMode) -> Resolution {
        match mode {
            ImportMode::Overwrite => {
                let incoming_ids: HashSet<&str> = self
                    .incoming
                    .projects
                    .iter()
                    .map(|p| p.id.as_str())
                    .collect();
                let discarded = current
                    .iter()
                    .filter(|p| !incoming_ids.contains(p.id.as_str()))
                    .map(|p| p.id.clone())
                    .collect();

                Resolution {
                    projects: self.incoming.projects.clone(),
                    tests_added: 0,
                    discarded,
                }
            }
            ImportMode::Merge => {
                let outcome = merge_with_stats(current, &self.incoming.projects);
                Resolution {
                    projects: outcome.projects,
                    tests_added: outcome.stats.tests_added,
                    discarded: Vec::new(),
                }
            }
        }
    }

    /// Report what `apply` would do with the store's current content.
    pub fn preview<S: ProjectStore + ?Sized>(
        &self,
        store: &S,
        mode: ImportMode,
    ) -> Result<DryRunResult> {
        let current = store.get_all()?;
        let resolution = self.resolve(&current, mode);

        let mut warnings = Vec::new();
        let duplicates = self.incoming.duplicate_ids();
        if !duplicates.is_empty() {
            let message = format!("duplicate project ids in file: {}", duplicates.join(", "));
            match mode {
                ImportMode::Overwrite => {
                    warnings.push(format!("{}; overwrite will fail", message))
                }
                ImportMode::Merge => warnings.push(message),
            }
        }

        Ok(DryRunResult {
            mode,
            existing_projects: current.len(),
            resulting_projects: resolution.projects.len(),
            new_projects: self.classification.new_projects.len(),
            conflicting_projects: self.classification.conflicting_projects.len(),
            identical_projects: self.classification.identical_projects.len(),
            tests_added: resolution.tests_added,
            would_discard: resolution.discarded,
            conflicts: self.conflict_ids(),
            warnings,
        })
    }

    /// Apply the chosen resolution and persist it atomically.
    ///
    /// Merge re-reads the stored collection so it merges into what is
    /// persisted now. A store failure leaves the previous collection intact.
    pub fn apply<S: ProjectStore + ?Sized>(self, store: &S, mode: ImportMode) -> Result<ImportReport> {
        let current = store.get_all()?;
        let resolution = self.resolve(&current, mode);

        let stats = match store.replace_all(&resolution.projects) {
            Ok(stats) => stats,
            Err(err) => {
                warn!(mode = mode.as_str(), error = %err, "import failed, store unchanged");
                return Err(err);
            }
        };

        info!(
            mode = mode.as_str(),
            removed = stats.removed,
            written = stats.inserted,
            tests_added = resolution.tests_added,
            "import applied"
        );

        Ok(ImportReport {
            mode,
            projects_removed: stats.removed,
            projects_written: stats.inserted,
            new_projects: self.classification.new_projects.len(),
            conflicting_projects: self.classification.conflicting_projects.len(),
            identical_projects: self.classification.identical_projects.len(),
            tests_added: resolution.tests_added,
            discarded: resolution.discarded,
        })
    }
}
