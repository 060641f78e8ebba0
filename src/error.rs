use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    ProjectNotFound,
    TaskNotFound,
    BaselineNotFound,
    BaselineLocked,
    BaselineNameConflict,
    DanglingEdge,
    DuplicateEdge,
    SelfLoop,
    CycleDetected,
    LagOutOfRange,
    InvalidTask,
    ScopeMismatch,
    NoFeasibleSchedule,
    ValidationError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::BaselineNotFound => "BASELINE_NOT_FOUND",
            Self::BaselineLocked => "BASELINE_LOCKED",
            Self::BaselineNameConflict => "BASELINE_NAME_CONFLICT",
            Self::DanglingEdge => "DANGLING_EDGE",
            Self::DuplicateEdge => "DUPLICATE_EDGE",
            Self::SelfLoop => "SELF_LOOP",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::LagOutOfRange => "LAG_OUT_OF_RANGE",
            Self::InvalidTask => "INVALID_TASK",
            Self::ScopeMismatch => "SCOPE_MISMATCH",
            Self::NoFeasibleSchedule => "NO_FEASIBLE_SCHEDULE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Database not initialized at {0}. Run `critpath init` first.")]
    NotInitialized(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("Baseline {0} is locked and cannot be modified")]
    BaselineLocked(String),

    #[error("Baseline named '{name}' already exists in project {project_id}")]
    BaselineNameConflict { project_id: String, name: String },

    #[error("Dependency {predecessor} -> {successor} references task {missing} outside the project")]
    DanglingEdge {
        predecessor: String,
        successor: String,
        missing: String,
    },

    #[error("Duplicate dependency {predecessor} -> {successor}")]
    DuplicateEdge {
        predecessor: String,
        successor: String,
    },

    #[error("Task {0} depends on itself")]
    SelfLoop(String),

    #[error("Dependency cycle detected: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<String> },

    #[error("Lag of {lag_minutes} minutes on {predecessor} -> {successor} exceeds ±{limit}")]
    LagOutOfRange {
        predecessor: String,
        successor: String,
        lag_minutes: i64,
        limit: i64,
    },

    #[error("Invalid task {task_id}: {reason}")]
    InvalidTask { task_id: String, reason: String },

    #[error("{entity} {id} does not belong to project {project_id}")]
    ScopeMismatch {
        entity: &'static str,
        id: String,
        project_id: String,
    },

    #[error("Schedule is infeasible: {} task(s) with negative float (worst {worst_float_minutes} min on {worst_task})", .task_ids.len())]
    NoFeasibleSchedule {
        task_ids: Vec<String>,
        worst_task: String,
        worst_float_minutes: i64,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

fn format_cycle(cycle: &[String]) -> String {
    let mut path = cycle.join(" -> ");
    if let Some(first) = cycle.first() {
        path.push_str(" -> ");
        path.push_str(first);
    }
    path
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            Self::TaskNotFound(_) => ErrorCode::TaskNotFound,
            Self::BaselineNotFound(_) => ErrorCode::BaselineNotFound,
            Self::BaselineLocked(_) => ErrorCode::BaselineLocked,
            Self::BaselineNameConflict { .. } => ErrorCode::BaselineNameConflict,
            Self::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            Self::DuplicateEdge { .. } => ErrorCode::DuplicateEdge,
            Self::SelfLoop(_) => ErrorCode::SelfLoop,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::LagOutOfRange { .. } => ErrorCode::LagOutOfRange,
            Self::InvalidTask { .. } => ErrorCode::InvalidTask,
            Self::ScopeMismatch { .. } => ErrorCode::ScopeMismatch,
            Self::NoFeasibleSchedule { .. } => ErrorCode::NoFeasibleSchedule,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Graph-shape errors. These are always fatal to a recompute.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DanglingEdge { .. }
                | Self::DuplicateEdge { .. }
                | Self::SelfLoop(_)
                | Self::CycleDetected { .. }
                | Self::LagOutOfRange { .. }
        )
    }

    /// Storage failures worth one local retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
