use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::cli::{finish, Context};
use crate::db::{project_repo, task_repo};
use crate::error::Result;
use crate::output;

pub fn run(cmd: TaskCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        TaskCommands::Progress {
            project,
            task,
            percent,
            actual_cost,
        } => run_progress(ctx, &project, &task, percent, actual_cost),
        TaskCommands::Remove { project, task } => run_remove(ctx, &project, &task),
    };
    finish(result, ctx.json)
}

fn run_progress(ctx: &Context, project: &str, task_id: &str, percent: u8, actual_cost: Option<i64>) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let task = engine.store().transaction(|conn| {
        project_repo::get_project(conn, &key)?;
        let current = task_repo::get_task(conn, &key.project_id, task_id)?;
        let cost = actual_cost.unwrap_or(current.actual_cost);
        task_repo::update_progress(conn, &key.project_id, task_id, percent, cost)?;
        task_repo::get_task(conn, &key.project_id, task_id)
    })?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::task_json(&task)));
    } else {
        println!(
            "Task {}: {}% complete, actual cost {}",
            task.id, task.percent_complete, task.actual_cost
        );
    }
    Ok(0)
}

fn run_remove(ctx: &Context, project: &str, task_id: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    engine.store().transaction(|conn| {
        project_repo::get_project(conn, &key)?;
        task_repo::delete_task(conn, &key.project_id, task_id)
    })?;

    if ctx.json {
        output::json::print(&output::json::success(json!({ "removed": task_id })));
    } else {
        println!("Removed task {task_id}");
    }
    Ok(0)
}
