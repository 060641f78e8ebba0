use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant scoping carried by every engine call. A project id alone is never
/// enough to read or write anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectKey {
    pub organization_id: String,
    pub workspace_id: String,
    pub project_id: String,
}

impl ProjectKey {
    pub fn new(
        organization_id: impl Into<String>,
        workspace_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            workspace_id: workspace_id.into(),
            project_id: project_id.into(),
        }
    }
}

impl std::fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.organization_id, self.workspace_id, self.project_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub key: ProjectKey,
    pub name: String,
    /// Anchor for tasks without predecessors.
    pub schedule_from: DateTime<Utc>,
    /// Explicit finish target for the backward pass.
    pub deadline: Option<DateTime<Utc>>,
}

/// Consistent point-in-time read of one project's scheduling inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub tasks: Vec<super::Task>,
    pub dependencies: Vec<super::Dependency>,
}
