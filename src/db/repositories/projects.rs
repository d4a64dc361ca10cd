use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::Project,
    repositories::sessions::sessions_for_project,
};

fn row_to_project(row: &Row) -> Result<Project> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        completed: row.get("completed")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
        sessions: Vec::new(),
    })
}

const PROJECT_COLUMNS: &str = "id, name, description, completed, created_at, updated_at";

impl Database {
    /// True if a project with this exact name is present among current
    /// records. The view-model checks this before any save so duplicates are
    /// rejected without touching the store.
    pub async fn project_exists(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn insert_project(&self, project: &Project) -> Result<()> {
        let record = project.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO projects (id, name, description, completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.name,
                    record.description,
                    record.completed,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert project")?;
            Ok(())
        })
        .await
    }

    /// Every project record with its sessions loaded, in insertion order.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at ASC",
            ))?;

            let mut rows = stmt.query([])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                projects.push(row_to_project(row)?);
            }

            for project in &mut projects {
                project.sessions = sessions_for_project(conn, &project.id)?;
            }

            Ok(projects)
        })
        .await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        let project_id = project_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1",
            ))?;

            let mut rows = stmt.query(params![project_id])?;
            let mut project = match rows.next()? {
                Some(row) => Some(row_to_project(row)?),
                None => None,
            };

            if let Some(project) = project.as_mut() {
                project.sessions = sessions_for_project(conn, &project.id)?;
            }
            Ok(project)
        })
        .await
    }

    /// First record matching the name, or none. The name is effectively
    /// unique among current records, so "first" is also "only".
    #[allow(dead_code)]
    pub async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let name = name.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1 LIMIT 1",
            ))?;

            let mut rows = stmt.query(params![name])?;
            let mut project = match rows.next()? {
                Some(row) => Some(row_to_project(row)?),
                None => None,
            };

            if let Some(project) = project.as_mut() {
                project.sessions = sessions_for_project(conn, &project.id)?;
            }
            Ok(project)
        })
        .await
    }

    /// Case-insensitive substring match on name. The aggregation engine
    /// restricts the results to non-completed projects on top of this.
    pub async fn search_projects_by_name(&self, substring: &str) -> Result<Vec<Project>> {
        let substring = substring.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE lower(name) LIKE '%' || lower(?1) || '%'
                 ORDER BY created_at ASC",
            ))?;

            let mut rows = stmt.query(params![substring])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                projects.push(row_to_project(row)?);
            }

            for project in &mut projects {
                project.sessions = sessions_for_project(conn, &project.id)?;
            }

            Ok(projects)
        })
        .await
    }

    /// Full-record replace keyed by id. Child sessions are managed through
    /// `insert_work_session` / `mark_sessions_invoiced`, not here.
    pub async fn update_project(&self, project: &Project) -> Result<()> {
        let record = project.clone();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE projects
                 SET name = ?1,
                     description = ?2,
                     completed = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    record.name,
                    record.description,
                    record.completed,
                    record.updated_at.to_rfc3339(),
                    record.id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Project not found"));
            }

            Ok(())
        })
        .await
    }

    /// Delete a project. Its work sessions go with it via ON DELETE CASCADE.
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let project_id = project_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn delete_all_projects(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM projects", [])?;
            Ok(())
        })
        .await
    }
}
