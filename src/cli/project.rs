use std::collections::HashSet;
use std::io::{self, Read};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::cli::commands::ProjectCommands;
use crate::cli::{finish, Context};
use crate::db::{dependency_repo, project_repo, task_repo};
use crate::error::{EngineError, Result};
use crate::graph::ProjectGraph;
use crate::models::{ConstraintType, Dependency, Project, ProjectKey, Task};
use crate::output;

pub fn run(cmd: ProjectCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        ProjectCommands::Load => run_load(ctx),
        ProjectCommands::Show { project } => run_show(ctx, &project),
    };
    finish(result, ctx.json)
}

// --- project load ---

#[derive(Deserialize)]
struct ProjectLoadInput {
    organization_id: String,
    workspace_id: String,
    project: ProjectInput,
    #[serde(default)]
    tasks: Vec<TaskInput>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Deserialize)]
struct ProjectInput {
    id: String,
    name: String,
    schedule_from: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TaskInput {
    id: String,
    #[serde(default)]
    name: String,
    planned_start: Option<DateTime<Utc>>,
    planned_end: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    percent_complete: u8,
    #[serde(default)]
    is_milestone: bool,
    #[serde(default)]
    constraint_type: ConstraintType,
    constraint_date: Option<DateTime<Utc>>,
    #[serde(default)]
    budgeted_cost: i64,
    #[serde(default)]
    actual_cost: i64,
}

impl TaskInput {
    fn into_task(self, project_id: &str) -> Task {
        Task {
            id: self.id,
            project_id: project_id.to_string(),
            name: self.name,
            planned_start: self.planned_start,
            planned_end: self.planned_end,
            duration_minutes: self.duration_minutes,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            percent_complete: self.percent_complete,
            is_milestone: self.is_milestone,
            constraint_type: self.constraint_type,
            constraint_date: self.constraint_date,
            budgeted_cost: self.budgeted_cost,
            actual_cost: self.actual_cost,
        }
    }
}

fn run_load(ctx: &Context) -> Result<i32> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| EngineError::validation(e.to_string()))?;
    let load: ProjectLoadInput =
        serde_json::from_str(&input).map_err(|e| EngineError::validation(format!("Invalid JSON: {e}")))?;

    if load.organization_id.is_empty() || load.workspace_id.is_empty() || load.project.id.is_empty() {
        return Err(EngineError::validation(
            "organization_id, workspace_id and project.id are required",
        ));
    }
    let key = ProjectKey::new(load.organization_id, load.workspace_id, load.project.id);
    ctx.check_scope(&key)?;

    let project = Project {
        key: key.clone(),
        name: load.project.name,
        schedule_from: load.project.schedule_from,
        deadline: load.project.deadline,
    };
    let tasks: Vec<Task> = load
        .tasks
        .into_iter()
        .map(|t| t.into_task(&key.project_id))
        .collect();
    for t in &tasks {
        if t.id.is_empty() {
            return Err(EngineError::validation("Task id is required"));
        }
        t.validate()?;
    }

    let engine = ctx.engine()?;
    let max_lag = engine.config().max_lag_minutes;
    let (created, added) = engine.store().transaction(|conn| {
        let created = match project_repo::find_project(conn, &key.project_id)? {
            None => {
                project_repo::create_project(conn, &project)?;
                true
            }
            Some(existing) if existing.key == key => {
                project_repo::update_schedule_window(conn, &key, project.schedule_from, project.deadline)?;
                false
            }
            Some(_) => {
                return Err(EngineError::validation(format!(
                    "Project id {} is already used in another workspace",
                    key.project_id
                )))
            }
        };
        for t in &tasks {
            task_repo::upsert_task(conn, t)?;
        }

        let mut edges = dependency_repo::list_dependencies(conn, &key.project_id)?;
        let stored: HashSet<(String, String)> = edges
            .iter()
            .map(|d| (d.predecessor_id.clone(), d.successor_id.clone()))
            .collect();
        let new_edges: Vec<&Dependency> = load
            .dependencies
            .iter()
            .filter(|d| !stored.contains(&(d.predecessor_id.clone(), d.successor_id.clone())))
            .collect();
        edges.extend(new_edges.iter().map(|d| (*d).clone()));

        let live = task_repo::list_tasks(conn, &key.project_id)?;
        ProjectGraph::build(&key.project_id, &live, &edges, max_lag)?;

        for d in &new_edges {
            dependency_repo::add_dependency(conn, &key.project_id, d)?;
        }
        Ok((created, new_edges.len()))
    })?;
    info!(project = %key, tasks = tasks.len(), dependencies = added, created, "project loaded");

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "project": output::json::project_json(&project),
            "created": created,
            "tasks_loaded": tasks.len(),
            "dependencies_added": added
        })));
    } else {
        println!(
            "{} project '{}' with {} tasks and {} new dependencies.",
            if created { "Loaded" } else { "Updated" },
            key.project_id,
            tasks.len(),
            added
        );
    }
    Ok(0)
}

fn run_show(ctx: &Context, project_id: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project_id)?;
    let (project, tasks) = engine.store().with_conn(|conn| {
        let project = project_repo::get_project(conn, &key)?;
        let tasks = task_repo::list_tasks(conn, &key.project_id)?;
        Ok((project, tasks))
    })?;
    let schedule = engine.latest_schedule(&key)?;

    if ctx.json {
        let tasks_json: Vec<_> = tasks.iter().map(output::json::task_json).collect();
        output::json::print(&output::json::success(json!({
            "project": output::json::project_json(&project),
            "tasks": tasks_json,
            "schedule": schedule.as_ref().map(output::json::schedule_json)
        })));
    } else {
        output::text::print_project(&project, &tasks);
        match schedule {
            Some(ref s) => {
                println!();
                output::text::print_schedule(s);
            }
            None => println!("\nNo schedule computed yet."),
        }
    }
    Ok(0)
}
