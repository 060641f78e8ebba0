use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConstraintType, ProjectKey};

/// CPM output for one task. Dates are absolute; floats are exact minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub task_id: String,
    pub duration_minutes: i64,
    pub early_start: DateTime<Utc>,
    pub early_finish: DateTime<Utc>,
    pub late_start: DateTime<Utc>,
    pub late_finish: DateTime<Utc>,
    pub total_float_minutes: i64,
    pub free_float_minutes: i64,
    pub critical: bool,
    pub constraint_violated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    ConstraintViolated {
        task_id: String,
        constraint: ConstraintType,
        constraint_date: DateTime<Utc>,
    },
    NegativeFloat {
        task_id: String,
        float_minutes: i64,
    },
}

impl ScheduleWarning {
    pub fn task_id(&self) -> &str {
        match self {
            Self::ConstraintViolated { task_id, .. } | Self::NegativeFloat { task_id, .. } => task_id,
        }
    }
}

/// Result of one recompute. Contains no wall-clock data so two runs over the
/// same snapshot compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub project: ProjectKey,
    pub schedule_from: DateTime<Utc>,
    pub project_finish: DateTime<Utc>,
    /// Topological order, ties broken by task id.
    pub tasks: Vec<TaskSchedule>,
    /// Zero-float tasks in topological order.
    pub critical_path: Vec<String>,
    pub warnings: Vec<ScheduleWarning>,
}

impl ScheduleResult {
    pub fn task(&self, task_id: &str) -> Option<&TaskSchedule> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn negative_float_tasks(&self) -> impl Iterator<Item = &TaskSchedule> {
        self.tasks.iter().filter(|t| t.total_float_minutes < 0)
    }

    pub fn is_feasible(&self) -> bool {
        self.negative_float_tasks().next().is_none()
    }
}
