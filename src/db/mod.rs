pub mod connection;
pub mod migrations;
pub mod project_repo;
pub mod task_repo;
pub mod dependency_repo;
pub mod schedule_repo;
pub mod baseline_repo;
pub mod earned_value_repo;
pub mod source;

pub use connection::*;
pub use source::SnapshotSource;
