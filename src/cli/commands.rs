use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::logging::LogLevel;

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "critpath",
    version = VERSION,
    about = "Critical path scheduling and earned value engine",
    after_help = "\
NOTE:
  Run `critpath init` before any other command.
  Engine settings are read from critpath.json next to the database unless --config is given.

EXIT CODES:
  0  Success
  1  Error (structural graph error, validation, database, etc.)

SCOPE:
  Every project belongs to an organization and workspace. Pass --org/--workspace
  (or CRITPATH_ORG/CRITPATH_WORKSPACE) to require a match; ids from another scope
  are reported as not found."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file
    #[arg(long, global = true, env = "CRITPATH_DB", default_value = "critpath.db")]
    pub db: PathBuf,

    /// Engine config file (default: critpath.json next to the database)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Required organization of the addressed project
    #[arg(long, global = true, env = "CRITPATH_ORG")]
    pub org: Option<String>,

    /// Required workspace of the addressed project
    #[arg(long, global = true, env = "CRITPATH_WORKSPACE")]
    pub workspace: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level (overrides CRITPATH_LOG)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database
    Init,

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task progress and removal
    #[command(subcommand)]
    Task(TaskCommands),

    /// Dependency management
    #[command(subcommand)]
    Dep(DepCommands),

    /// Recompute and store the project schedule
    #[command(after_help = "\
NOTE:
  Structural errors (cycle, dangling or duplicate edge, self-loop, lag out of range)
  leave the previously stored schedule untouched.")]
    Recompute {
        /// Project ID
        project: String,
    },

    /// Baseline management
    #[command(subcommand)]
    Baseline(BaselineCommands),

    /// Compare the current schedule with the active baseline
    Variance {
        /// Project ID
        project: String,
    },

    /// Earned value metrics
    #[command(subcommand)]
    Ev(EvCommands),
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Load a project with tasks and dependencies from stdin JSON
    #[command(after_help = "\
STDIN FORMAT:
  {\"organization_id\":\"org\", \"workspace_id\":\"ws\",
   \"project\":{\"id\":\"p1\", \"name\":\"...\", \"schedule_from\":\"2025-03-01T00:00:00Z\", \"deadline\":null},
   \"tasks\":[{\"id\":\"a\", \"duration_minutes\":480, \"budgeted_cost\":100000}],
   \"dependencies\":[{\"predecessor_id\":\"a\", \"successor_id\":\"b\", \"lag_minutes\":0}]}

NOTE:
  Atomic: all-or-nothing. Rejects cycles, self-loops, duplicate and dangling edges.
  Loading an existing project updates its window and upserts tasks and edges.")]
    Load,
    /// Show project, tasks and the last stored schedule
    Show {
        /// Project ID
        project: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Record progress on a task
    Progress {
        /// Project ID
        project: String,
        /// Task ID
        task: String,
        /// Percent complete (0-100)
        #[arg(long)]
        percent: u8,
        /// Actual cost to date in minor currency units
        #[arg(long)]
        actual_cost: Option<i64>,
    },
    /// Soft-delete a task (its edges remain and are reported as dangling)
    Remove {
        /// Project ID
        project: String,
        /// Task ID
        task: String,
    },
}

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a finish-to-start dependency
    Add {
        /// Project ID
        project: String,
        /// Predecessor task ID
        predecessor: String,
        /// Successor task ID
        successor: String,
        /// Lag in minutes (negative for lead)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        lag: i64,
    },
    /// Remove a dependency
    Remove {
        /// Project ID
        project: String,
        /// Predecessor task ID
        predecessor: String,
        /// Successor task ID
        successor: String,
    },
}

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// Snapshot the current schedule as a locked baseline
    #[command(after_help = "\
NOTE:
  Fails with NO_FEASIBLE_SCHEDULE when any task has negative float,
  unless negative_float_policy is \"warn\" in the config file.")]
    Create {
        /// Project ID
        project: String,
        /// Baseline name (unique per project)
        name: String,
        /// Author recorded on the baseline
        #[arg(long)]
        by: Option<String>,
    },
    /// Make a baseline the project's single active baseline
    Activate {
        /// Baseline ID
        id: String,
    },
    /// List baselines of a project
    List {
        /// Project ID
        project: String,
    },
    /// Show a baseline and its items
    Show {
        /// Baseline ID
        id: String,
    },
    /// Delete a baseline and its items
    Purge {
        /// Baseline ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum EvCommands {
    /// Compute and store earned value as of a date
    Compute {
        /// Project ID
        project: String,
        /// Status date (YYYY-MM-DD), counted through the end of the day UTC
        #[arg(long)]
        as_of: NaiveDate,
    },
    /// Show the stored snapshot for one date
    Show {
        /// Project ID
        project: String,
        /// Status date (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,
    },
    /// Stored earned value snapshots, oldest first
    History {
        /// Project ID
        project: String,
    },
}
