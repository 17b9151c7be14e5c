//! Repository abstraction over the project collection.

use crate::error::{Error, Result};
use crate::types::{Dataset, NewTest, Project, ProjectPatch, TestPatch, TestRecord};

/// Row counts for an atomic collection replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceStats {
    pub removed: usize,
    pub inserted: usize,
}

/// Storage for the project collection.
///
/// Implementations keep insertion order for `get_all` and treat the project
/// id as a primary key: `bulk_insert` fails on an id that already exists (or
/// repeats within the batch) and inserts nothing in that case.
pub trait ProjectStore {
    /// All projects in collection order.
    fn get_all(&self) -> Result<Vec<Project>>;

    fn get_by_id(&self, id: &str) -> Result<Option<Project>>;

    /// Remove every project. Returns the number removed.
    fn clear(&self) -> Result<usize>;

    /// Append projects to the collection. Returns the number inserted.
    fn bulk_insert(&self, projects: &[Project]) -> Result<usize>;

    /// Read, change and write back one project under a single lock.
    ///
    /// If `f` fails nothing is written. Returns the stored result.
    fn modify(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut Project) -> Result<()>,
    ) -> Result<Project>;

    /// Clear and insert as one atomic step.
    ///
    /// On failure the collection is left exactly as it was.
    fn replace_all(&self, projects: &[Project]) -> Result<ReplaceStats>;

    /// Apply a partial update to one project and return the result.
    fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        self.modify(id, &mut |project| {
            patch.clone().apply(project);
            Ok(())
        })
    }

    /// Fetch a project or fail with `ProjectNotFound`.
    fn require(&self, id: &str) -> Result<Project> {
        self.get_by_id(id)?
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))
    }

    /// Create and store an empty project.
    fn create_project(&self, name: &str) -> Result<Project> {
        let project = Project::new(name);
        self.bulk_insert(std::slice::from_ref(&project))?;
        Ok(project)
    }

    /// Add an environment with an empty dataset. Adding an existing
    /// environment is a no-op.
    fn add_environment(&self, project_id: &str, environment: &str) -> Result<Project> {
        self.modify(project_id, &mut |project| {
            if !project.environments.iter().any(|e| e == environment) {
                project.environments.push(environment.to_string());
                project.data.entry(environment.to_string()).or_default();
            }
            Ok(())
        })
    }

    /// Replace the dataset of one environment.
    fn save_dataset(&self, project_id: &str, environment: &str, dataset: Dataset) -> Result<Project> {
        self.modify(project_id, &mut |project| {
            project.data.insert(environment.to_string(), dataset.clone());
            Ok(())
        })
    }

    /// Set one key of an environment dataset.
    fn set_data_value(
        &self,
        project_id: &str,
        environment: &str,
        key: &str,
        value: &str,
    ) -> Result<Project> {
        self.modify(project_id, &mut |project| {
            project
                .data
                .entry(environment.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    /// Remove one key of an environment dataset. Missing keys are ignored.
    fn remove_data_key(&self, project_id: &str, environment: &str, key: &str) -> Result<Project> {
        self.modify(project_id, &mut |project| {
            project
                .data
                .entry(environment.to_string())
                .or_default()
                .remove(key);
            Ok(())
        })
    }

    /// Record a new test at the front of the project's list.
    fn create_test(&self, project_id: &str, test: NewTest) -> Result<TestRecord> {
        let record = test.into_record();
        self.modify(project_id, &mut |project| {
            project.tests.insert(0, record.clone());
            Ok(())
        })?;
        Ok(record)
    }

    fn get_test(&self, project_id: &str, test_id: &str) -> Result<TestRecord> {
        let project = self.require(project_id)?;
        project
            .find_test(test_id)
            .cloned()
            .ok_or_else(|| Error::test_not_found(project_id, test_id))
    }

    fn update_test(&self, project_id: &str, test_id: &str, patch: TestPatch) -> Result<TestRecord> {
        let mut updated = None;
        self.modify(project_id, &mut |project| {
            let test = project
                .tests
                .iter_mut()
                .find(|t| t.id == test_id)
                .ok_or_else(|| Error::test_not_found(project_id, test_id))?;
            patch.clone().apply(test);
            updated = Some(test.clone());
            Ok(())
        })?;
        updated.ok_or_else(|| Error::test_not_found(project_id, test_id))
    }

    fn delete_test(&self, project_id: &str, test_id: &str) -> Result<()> {
        self.modify(project_id, &mut |project| {
            let before = project.tests.len();
            project.tests.retain(|t| t.id != test_id);
            if project.tests.len() == before {
                return Err(Error::test_not_found(project_id, test_id));
            }
            Ok(())
        })?;
        Ok(())
    }
}
