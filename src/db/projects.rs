//! Project persistence for the SQLite store.
//!
//! Each project is one row: the whole record as a JSON body, plus `name`
//! and `created_at` columns for indexing and a `position` column that keeps
//! collection order.

use super::Database;
use super::store::{ProjectStore, ReplaceStats};
use crate::error::{Error, Result};
use crate::types::Project;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

/// Parse a stored project body.
fn parse_body(id: &str, body: &str) -> Result<Project> {
    serde_json::from_str(body)
        .map_err(|e| Error::Persistence(format!("corrupt project row {}: {}", id, e)))
}

fn encode_body(project: &Project) -> Result<String> {
    serde_json::to_string(project).map_err(|e| Error::Encode(e.to_string()))
}

/// Insert rows after the current last position. Caller owns the transaction.
fn insert_projects(conn: &Connection, projects: &[Project]) -> Result<usize> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM projects",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO projects (id, position, name, created_at, body) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (offset, project) in projects.iter().enumerate() {
        let body = encode_body(project)?;
        stmt.execute(params![
            project.id,
            next + offset as i64,
            project.name,
            project.created_at,
            body
        ])?;
    }

    Ok(projects.len())
}

fn delete_all(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM projects", [])?)
}

impl ProjectStore for Database {
    fn get_all(&self) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, body FROM projects ORDER BY position")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.iter()
                .map(|(id, body)| parse_body(id, body))
                .collect()
        })
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM projects WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })
                .optional()?;

            body.map(|b| parse_body(id, &b)).transpose()
        })
    }

    fn clear(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = delete_all(conn)?;
            debug!(removed, "cleared projects");
            Ok(removed)
        })
    }

    fn bulk_insert(&self, projects: &[Project]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let inserted = insert_projects(&tx, projects)?;
            tx.commit()?;
            debug!(inserted, "inserted projects");
            Ok(inserted)
        })
    }

    fn modify(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut Project) -> Result<()>,
    ) -> Result<Project> {
        // Read and write share one transaction and one lock acquisition;
        // an error from `f` drops `tx` uncommitted.
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let body: Option<String> = tx
                .query_row("SELECT body FROM projects WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(body) = body else {
                return Err(Error::ProjectNotFound(id.to_string()));
            };

            let mut project = parse_body(id, &body)?;
            f(&mut project)?;

            tx.execute(
                "UPDATE projects SET name = ?1, body = ?2 WHERE id = ?3",
                params![project.name, encode_body(&project)?, id],
            )?;
            tx.commit()?;

            Ok(project)
        })
    }

    fn replace_all(&self, projects: &[Project]) -> Result<ReplaceStats> {
        // An error anywhere drops `tx` uncommitted, which rolls it back.
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = delete_all(&tx)?;
            let inserted = insert_projects(&tx, projects)?;
            tx.commit()?;

            info!(removed, inserted, "replaced project collection");
            Ok(ReplaceStats { removed, inserted })
        })
    }
}
