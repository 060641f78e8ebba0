use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{EngineError, Result};
use crate::models::{Project, ProjectKey};

pub fn create_project(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        "INSERT INTO projects (id, organization_id, workspace_id, name, schedule_from, deadline)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            project.key.project_id,
            project.key.organization_id,
            project.key.workspace_id,
            project.name,
            project.schedule_from,
            project.deadline,
        ],
    )?;
    Ok(())
}

/// Look a project up by id alone. Used where the caller has no scope yet.
pub fn find_project(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT id, organization_id, workspace_id, name, schedule_from, deadline
             FROM projects WHERE id = ?1",
            params![project_id],
            row_to_project,
        )
        .optional()?;
    Ok(project)
}

/// Fetch a project, requiring the full organization/workspace scope to match.
/// A scope mismatch is reported as not found.
pub fn get_project(conn: &Connection, key: &ProjectKey) -> Result<Project> {
    match find_project(conn, &key.project_id)? {
        Some(project) if project.key == *key => Ok(project),
        _ => Err(EngineError::ProjectNotFound(key.to_string())),
    }
}

pub fn update_schedule_window(
    conn: &Connection,
    key: &ProjectKey,
    schedule_from: chrono::DateTime<chrono::Utc>,
    deadline: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE projects SET schedule_from = ?1, deadline = ?2
         WHERE id = ?3 AND organization_id = ?4 AND workspace_id = ?5",
        params![schedule_from, deadline, key.project_id, key.organization_id, key.workspace_id],
    )?;
    if changed == 0 {
        return Err(EngineError::ProjectNotFound(key.to_string()));
    }
    Ok(())
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        key: ProjectKey {
            project_id: row.get(0)?,
            organization_id: row.get(1)?,
            workspace_id: row.get(2)?,
        },
        name: row.get(3)?,
        schedule_from: row.get(4)?,
        deadline: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use chrono::{TimeZone, Utc};

    fn project() -> Project {
        Project {
            key: ProjectKey::new("org-1", "ws-1", "proj-1"),
            name: "Launch".into(),
            schedule_from: Utc.with_ymd_and_hms(2025, 2, 3, 9, 0, 0).unwrap(),
            deadline: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                create_project(conn, &project())?;
                assert_eq!(get_project(conn, &project().key)?, project());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_foreign_scope_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                create_project(conn, &project())?;
                let other = ProjectKey::new("org-2", "ws-1", "proj-1");
                let err = get_project(conn, &other).unwrap_err();
                assert_eq!(err.code().as_str(), "PROJECT_NOT_FOUND");
                assert!(update_schedule_window(conn, &other, project().schedule_from, None).is_err());
                Ok(())
            })
            .unwrap();
    }
}
