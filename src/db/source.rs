use crate::db::{dependency_repo, project_repo, task_repo, with_transaction, Store};
use crate::error::Result;
use crate::models::{ProjectKey, ProjectSnapshot};

/// Read side of the CRUD layer: one consistent view of a project's tasks
/// and edges.
pub trait SnapshotSource: Send + Sync {
    fn load_snapshot(&self, key: &ProjectKey) -> Result<ProjectSnapshot>;
}

impl SnapshotSource for Store {
    fn load_snapshot(&self, key: &ProjectKey) -> Result<ProjectSnapshot> {
        self.with_conn(|conn| {
            with_transaction(conn, |conn| {
                let project = project_repo::get_project(conn, key)?;
                let tasks = task_repo::list_tasks(conn, &key.project_id)?;
                let dependencies = dependency_repo::list_dependencies(conn, &key.project_id)?;
                Ok(ProjectSnapshot {
                    project,
                    tasks,
                    dependencies,
                })
            })
        })
    }
}
