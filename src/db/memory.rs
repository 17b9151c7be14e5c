//! In-memory project store.
//!
//! Has no transactions of its own; `replace_all` snapshots the collection
//! and restores it if the insert half fails.

use super::store::{ProjectStore, ReplaceStats};
use crate::error::{Error, Result};
use crate::types::Project;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Mutex<Vec<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Project>>> {
        self.projects
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))
    }
}

/// Append with primary-key semantics: all or nothing.
fn insert_checked(existing: &mut Vec<Project>, projects: &[Project]) -> Result<usize> {
    {
        let mut ids: HashSet<&str> = existing.iter().map(|p| p.id.as_str()).collect();
        for project in projects {
            if !ids.insert(project.id.as_str()) {
                return Err(Error::Persistence(format!(
                    "duplicate project id: {}",
                    project.id
                )));
            }
        }
    }

    existing.extend_from_slice(projects);
    Ok(projects.len())
}

impl ProjectStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<Project>> {
        Ok(self.lock()?.clone())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.lock()?.iter().find(|p| p.id == id).cloned())
    }

    fn clear(&self) -> Result<usize> {
        let mut projects = self.lock()?;
        let removed = projects.len();
        projects.clear();
        Ok(removed)
    }

    fn bulk_insert(&self, projects: &[Project]) -> Result<usize> {
        let mut existing = self.lock()?;
        insert_checked(&mut existing, projects)
    }

    fn modify(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut Project) -> Result<()>,
    ) -> Result<Project> {
        let mut projects = self.lock()?;
        let slot = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;

        let mut project = slot.clone();
        f(&mut project)?;
        *slot = project.clone();
        Ok(project)
    }

    fn replace_all(&self, projects: &[Project]) -> Result<ReplaceStats> {
        let mut current = self.lock()?;
        let snapshot = std::mem::take(&mut *current);
        let removed = snapshot.len();

        match insert_checked(&mut current, projects) {
            Ok(inserted) => {
                debug!(removed, inserted, "replaced in-memory collection");
                Ok(ReplaceStats { removed, inserted })
            }
            Err(err) => {
                warn!(error = %err, "replace failed, restoring previous collection");
                *current = snapshot;
                Err(err)
            }
        }
    }
}
