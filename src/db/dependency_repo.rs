use rusqlite::{params, Connection};

use crate::error::{EngineError, Result};
use crate::models::Dependency;

pub fn add_dependency(conn: &Connection, project_id: &str, dep: &Dependency) -> Result<()> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO task_dependencies (project_id, predecessor_id, successor_id, lag_minutes)
         VALUES (?1, ?2, ?3, ?4)",
        params![project_id, dep.predecessor_id, dep.successor_id, dep.lag_minutes],
    )?;
    if inserted == 0 {
        return Err(EngineError::DuplicateEdge {
            predecessor: dep.predecessor_id.clone(),
            successor: dep.successor_id.clone(),
        });
    }
    Ok(())
}

pub fn remove_dependency(conn: &Connection, project_id: &str, predecessor_id: &str, successor_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM task_dependencies
         WHERE project_id = ?1 AND predecessor_id = ?2 AND successor_id = ?3",
        params![project_id, predecessor_id, successor_id],
    )?;
    Ok(())
}

/// Every edge recorded for a project, including edges whose endpoints have
/// since been deleted. Ordered by (predecessor, successor).
pub fn list_dependencies(conn: &Connection, project_id: &str) -> Result<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT predecessor_id, successor_id, lag_minutes
         FROM task_dependencies
         WHERE project_id = ?1
         ORDER BY predecessor_id, successor_id",
    )?;
    let deps = stmt
        .query_map(params![project_id], |row| {
            Ok(Dependency {
                predecessor_id: row.get(0)?,
                successor_id: row.get(1)?,
                lag_minutes: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{project_repo, task_repo, Store};
    use crate::models::{Project, ProjectKey, Task};
    use chrono::{TimeZone, Utc};

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                project_repo::create_project(
                    conn,
                    &Project {
                        key: ProjectKey::new("o", "w", "p"),
                        name: "P".into(),
                        schedule_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                        deadline: None,
                    },
                )?;
                for id in ["a", "b", "c"] {
                    task_repo::upsert_task(conn, &Task::new(id, "p").with_duration(10))?;
                }
                Ok(())
            })
            .unwrap();
        store
    }

    #[test]
    fn test_add_list_remove() {
        let store = seeded();
        store
            .with_conn(|conn| {
                add_dependency(conn, "p", &Dependency::new("b", "c").with_lag(15))?;
                add_dependency(conn, "p", &Dependency::new("a", "b"))?;
                let deps = list_dependencies(conn, "p")?;
                assert_eq!(deps, vec![Dependency::new("a", "b"), Dependency::new("b", "c").with_lag(15)]);
                remove_dependency(conn, "p", "a", "b")?;
                assert_eq!(list_dependencies(conn, "p")?.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_storage_rejects_bad_edges() {
        let store = seeded();
        store
            .with_conn(|conn| {
                add_dependency(conn, "p", &Dependency::new("a", "b"))?;
                let dup = add_dependency(conn, "p", &Dependency::new("a", "b")).unwrap_err();
                assert_eq!(dup.code().as_str(), "DUPLICATE_EDGE");
                assert!(add_dependency(conn, "p", &Dependency::new("a", "a")).is_err());
                assert!(add_dependency(conn, "p", &Dependency::new("a", "c").with_lag(50_000)).is_err());
                Ok(())
            })
            .unwrap();
    }
}
