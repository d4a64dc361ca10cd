use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime},
    models::WorkSession,
};

fn row_to_session(row: &Row) -> Result<WorkSession> {
    let started_at: String = row.get("started_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;
    let created_at: String = row.get("created_at")?;

    Ok(WorkSession {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        invoiced: row.get("invoiced")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

/// Load every session belonging to a project, oldest first. Shared with the
/// project queries so a fetched `Project` always carries its children.
pub(super) fn sessions_for_project(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<WorkSession>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, started_at, stopped_at, invoiced, created_at
         FROM work_sessions
         WHERE project_id = ?1
         ORDER BY started_at ASC",
    )?;

    let mut rows = stmt.query(params![project_id])?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(row_to_session(row)?);
    }

    Ok(sessions)
}

impl Database {
    pub async fn insert_work_session(&self, session: &WorkSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO work_sessions (id, project_id, started_at, stopped_at, invoiced, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.project_id,
                    record.started_at.to_rfc3339(),
                    record
                        .stopped_at
                        .as_ref()
                        .map(|dt| dt.to_rfc3339()),
                    record.invoiced,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert work session")?;
            Ok(())
        })
        .await
    }

    /// Flag every open-for-invoicing session of a project as invoiced.
    /// Returns how many sessions were affected.
    pub async fn mark_sessions_invoiced(&self, project_id: &str) -> Result<usize> {
        let project_id = project_id.to_string();
        self.execute(move |conn| {
            let affected = conn
                .execute(
                    "UPDATE work_sessions
                     SET invoiced = 1
                     WHERE project_id = ?1 AND invoiced = 0",
                    params![project_id],
                )
                .with_context(|| "failed to mark sessions invoiced")?;
            Ok(affected)
        })
        .await
    }
}
