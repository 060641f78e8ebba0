use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::db::{baseline_repo, project_repo, Store};
use crate::engine::ScheduleEngine;
use crate::error::{EngineError, Result};
use crate::models::ProjectKey;

/// Resolved global flags shared by every command.
pub struct Context {
    pub db_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub org: Option<String>,
    pub workspace: Option<String>,
    pub json: bool,
}

impl Context {
    pub fn config_file(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.db_path.with_file_name("critpath.json"))
    }

    pub fn engine(&self) -> Result<ScheduleEngine> {
        let store = Store::open(&self.db_path)?;
        let config = EngineConfig::load(&self.config_file())?;
        Ok(ScheduleEngine::new(store, config))
    }

    /// Full key for `project_id`, honouring any --org/--workspace given.
    pub fn project_key(&self, engine: &ScheduleEngine, project_id: &str) -> Result<ProjectKey> {
        let project = engine
            .store()
            .with_conn(|conn| project_repo::find_project(conn, project_id))?
            .ok_or_else(|| EngineError::ProjectNotFound(project_id.to_string()))?;
        self.check_scope(&project.key)?;
        Ok(project.key)
    }

    /// Key of the project owning `baseline_id`.
    pub fn baseline_key(&self, engine: &ScheduleEngine, baseline_id: &str) -> Result<ProjectKey> {
        let baseline = engine
            .store()
            .with_conn(|conn| baseline_repo::get_baseline(conn, baseline_id))?;
        self.project_key(engine, &baseline.project_id)
    }

    pub fn check_scope(&self, key: &ProjectKey) -> Result<()> {
        let org_ok = self.org.as_deref().map_or(true, |o| o == key.organization_id);
        let ws_ok = self.workspace.as_deref().map_or(true, |w| w == key.workspace_id);
        if org_ok && ws_ok {
            Ok(())
        } else {
            Err(EngineError::ProjectNotFound(key.project_id.clone()))
        }
    }
}
