//! Diff functionality for comparing two versions of a project.
//!
//! Project-level fields are compared whole: a single differing dataset key
//! surfaces the entire `data` mapping as changed. Tests are matched by id and
//! reported as added or modified. Tests that exist only on the current side
//! are never reported as removed; `TestChanges::removed` stays empty.

use crate::types::{EnvironmentData, Project, TestRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Project fields that can differ between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectField {
    Name,
    Environments,
    Data,
}

impl ProjectField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Environments => "environments",
            ProjectField::Data => "data",
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a project field on one side of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Datasets(EnvironmentData),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
            FieldValue::Datasets(data) => {
                let envs: Vec<String> = data
                    .iter()
                    .map(|(env, dataset)| {
                        let pairs: Vec<String> = dataset
                            .iter()
                            .map(|(k, v)| format!("{}={}", k, v))
                            .collect();
                        format!("{} {{{}}}", env, pairs.join(", "))
                    })
                    .collect();
                write!(f, "{}", envs.join("; "))
            }
        }
    }
}

/// A single project field change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub key: ProjectField,
    pub current: FieldValue,
    pub incoming: FieldValue,
}

/// A test present on both sides with different content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedTest {
    pub current: TestRecord,
    pub incoming: TestRecord,
}

impl ModifiedTest {
    /// Names of the test fields that differ, in declaration order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let (a, b) = (&self.current, &self.incoming);
        let checks = [
            ("name", a.name != b.name),
            ("environment", a.environment != b.environment),
            ("data", a.data != b.data),
            ("description", a.description != b.description),
            ("functional", a.functional != b.functional),
            ("relatedTask", a.related_task != b.related_task),
            ("relatedTasks", a.related_tasks != b.related_tasks),
            ("layer", a.layer != b.layer),
            ("date", a.date != b.date),
            ("createdAt", a.created_at != b.created_at),
        ];
        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

/// Test-level diff results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestChanges {
    /// Tests present in incoming but not in current
    pub added: Vec<TestRecord>,
    /// Always empty; tests missing from incoming are not treated as removals
    pub removed: Vec<TestRecord>,
    /// Tests present on both sides with different content
    pub modified: Vec<ModifiedTest>,
}

impl TestChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Complete diff between the current and incoming version of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDiff {
    pub project_id: String,
    pub project_name: String,
    pub fields: Vec<FieldChange>,
    pub tests: TestChanges,
}

impl ProjectDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tests.is_empty()
    }

    /// Total number of changes (fields plus tests).
    pub fn change_count(&self) -> usize {
        self.fields.len() + self.tests.change_count()
    }

    pub fn field(&self, key: ProjectField) -> Option<&FieldChange> {
        self.fields.iter().find(|f| f.key == key)
    }
}

impl fmt::Display for ProjectDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project: {} ({})", self.project_name, self.project_id)?;
        writeln!(f, "{}", "-".repeat(40))?;

        if self.is_empty() {
            writeln!(f, "  No differences found.")?;
            return Ok(());
        }

        for change in &self.fields {
            writeln!(f, "  ~ {}", change.key)?;
            writeln!(f, "      current:  {}", change.current)?;
            writeln!(f, "      incoming: {}", change.incoming)?;
        }

        if !self.tests.added.is_empty() {
            writeln!(f, "  Added tests ({}):", self.tests.added.len())?;
            for test in &self.tests.added {
                writeln!(f, "    + {}", format_test_brief(test))?;
            }
        }

        if !self.tests.modified.is_empty() {
            writeln!(f, "  Modified tests ({}):", self.tests.modified.len())?;
            for modified in &self.tests.modified {
                writeln!(
                    f,
                    "    ~ {} [{}]",
                    format_test_brief(&modified.current),
                    modified.changed_fields().join(", ")
                )?;
                if modified.current.name != modified.incoming.name {
                    writeln!(
                        f,
                        "        name: {:?} -> {:?}",
                        modified.current.name, modified.incoming.name
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Format a test for brief display.
fn format_test_brief(test: &TestRecord) -> String {
    let name = if test.name.chars().count() > 40 {
        let truncated: String = test.name.chars().take(37).collect();
        format!("{}...", truncated)
    } else {
        test.name.clone()
    };

    if name.is_empty() {
        test.id.clone()
    } else {
        format!("{} ({})", test.id, name)
    }
}

/// Compare the current version of a project against an incoming one.
pub fn compare_project(current: &Project, incoming: &Project) -> ProjectDiff {
    let mut fields = Vec::new();

    if current.name != incoming.name {
        fields.push(FieldChange {
            key: ProjectField::Name,
            current: FieldValue::Text(current.name.clone()),
            incoming: FieldValue::Text(incoming.name.clone()),
        });
    }

    if current.environments != incoming.environments {
        fields.push(FieldChange {
            key: ProjectField::Environments,
            current: FieldValue::List(current.environments.clone()),
            incoming: FieldValue::List(incoming.environments.clone()),
        });
    }

    if current.data != incoming.data {
        fields.push(FieldChange {
            key: ProjectField::Data,
            current: FieldValue::Datasets(current.data.clone()),
            incoming: FieldValue::Datasets(incoming.data.clone()),
        });
    }

    ProjectDiff {
        project_id: current.id.clone(),
        project_name: current.name.clone(),
        fields,
        tests: diff_tests(&current.tests, &incoming.tests),
    }
}

/// Match incoming tests against current ones by id.
fn diff_tests(current: &[TestRecord], incoming: &[TestRecord]) -> TestChanges {
    // Ids are taken out of the index once matched, so a repeated incoming id
    // is reported as added the second time.
    let mut unmatched: HashMap<&str, &TestRecord> =
        current.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut changes = TestChanges::default();

    for test in incoming {
        match unmatched.remove(test.id.as_str()) {
            None => changes.added.push(test.clone()),
            Some(existing) if existing != test => changes.modified.push(ModifiedTest {
                current: existing.clone(),
                incoming: test.clone(),
            }),
            Some(_) => {}
        }
    }

    changes
}
