use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBaseline {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub locked: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineItem {
    pub baseline_id: String,
    pub task_id: String,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub critical_path: bool,
    pub total_float_minutes: i64,
    pub captured_at: DateTime<Utc>,
}

/// Current schedule measured against the active baseline. Positive variance
/// means the task now starts/finishes later than baselined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskVariance {
    pub task_id: String,
    pub baseline_start: DateTime<Utc>,
    pub baseline_finish: DateTime<Utc>,
    pub current_start: DateTime<Utc>,
    pub current_finish: DateTime<Utc>,
    pub start_variance_minutes: i64,
    pub finish_variance_minutes: i64,
}
