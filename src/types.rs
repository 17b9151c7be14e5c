//! Core types for projects, environments and recorded tests.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value mapping for one environment.
///
/// Key-sorted, so two datasets holding the same pairs compare equal no
/// matter the order they were written in.
pub type Dataset = BTreeMap<String, String>;

/// Environment name -> dataset.
pub type EnvironmentData = BTreeMap<String, Dataset>;

/// A project with its environments, datasets and recorded tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Unique environment names in insertion order.
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub data: EnvironmentData,
    /// Display order, newest first when created locally.
    #[serde(default)]
    pub tests: Vec<TestRecord>,
    #[serde(default)]
    pub created_at: String,
}

impl Project {
    /// Create an empty project with a fresh id and creation timestamp.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            environments: Vec::new(),
            data: EnvironmentData::new(),
            tests: Vec::new(),
            created_at: now_iso(),
        }
    }

    pub fn find_test(&self, test_id: &str) -> Option<&TestRecord> {
        self.tests.iter().find(|t| t.id == test_id)
    }

    /// Dataset for an environment, if one has been saved.
    pub fn dataset(&self, environment: &str) -> Option<&Dataset> {
        self.data.get(environment)
    }
}

/// A recorded test execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Name of the project environment the test ran against.
    #[serde(default)]
    pub environment: String,
    /// Copy of the environment dataset taken at creation, possibly edited.
    #[serde(default)]
    pub data: Dataset,
    /// Rich-text markup, opaque here.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub functional: String,
    /// Legacy single related task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_tasks: Option<Vec<String>>,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub created_at: String,
}

impl TestRecord {
    /// Related tasks, preferring the list field over the legacy one.
    pub fn related(&self) -> Vec<&str> {
        match (&self.related_tasks, &self.related_task) {
            (Some(tasks), _) => tasks.iter().map(String::as_str).collect(),
            (None, Some(task)) if !task.is_empty() => vec![task.as_str()],
            _ => Vec::new(),
        }
    }
}

/// Input for recording a new test.
#[derive(Debug, Clone, Default)]
pub struct NewTest {
    pub name: String,
    pub environment: String,
    pub data: Dataset,
    pub description: String,
    pub functional: String,
    pub related_tasks: Vec<String>,
    pub layer: String,
    pub date: String,
}

impl NewTest {
    pub(crate) fn into_record(self) -> TestRecord {
        TestRecord {
            id: new_id(),
            name: self.name,
            environment: self.environment,
            data: self.data,
            description: self.description,
            functional: self.functional,
            related_task: None,
            related_tasks: Some(self.related_tasks),
            layer: self.layer,
            date: self.date,
            created_at: now_iso(),
        }
    }
}

/// Partial update for a test. `id` and `createdAt` are immutable.
#[derive(Debug, Clone, Default)]
pub struct TestPatch {
    pub name: Option<String>,
    pub environment: Option<String>,
    pub data: Option<Dataset>,
    pub description: Option<String>,
    pub functional: Option<String>,
    pub related_tasks: Option<Vec<String>>,
    pub layer: Option<String>,
    pub date: Option<String>,
}

impl TestPatch {
    pub(crate) fn apply(self, test: &mut TestRecord) {
        if let Some(name) = self.name {
            test.name = name;
        }
        if let Some(environment) = self.environment {
            test.environment = environment;
        }
        if let Some(data) = self.data {
            test.data = data;
        }
        if let Some(description) = self.description {
            test.description = description;
        }
        if let Some(functional) = self.functional {
            test.functional = functional;
        }
        if let Some(related) = self.related_tasks {
            test.related_tasks = Some(related);
        }
        if let Some(layer) = self.layer {
            test.layer = layer;
        }
        if let Some(date) = self.date {
            test.date = date;
        }
    }
}

/// Partial update for a project, applied by `ProjectStore::update`.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub environments: Option<Vec<String>>,
    pub data: Option<EnvironmentData>,
    pub tests: Option<Vec<TestRecord>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.environments.is_none()
            && self.data.is_none()
            && self.tests.is_none()
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(environments) = self.environments {
            project.environments = environments;
        }
        if let Some(data) = self.data {
            project.data = data;
        }
        if let Some(tests) = self.tests {
            project.tests = tests;
        }
    }
}

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as an ISO-8601 string with millisecond precision, UTC.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
