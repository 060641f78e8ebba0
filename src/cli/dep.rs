use serde_json::json;

use crate::cli::commands::DepCommands;
use crate::cli::{finish, Context};
use crate::db::{dependency_repo, project_repo};
use crate::error::Result;
use crate::models::Dependency;
use crate::output;

pub fn run(cmd: DepCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        DepCommands::Add {
            project,
            predecessor,
            successor,
            lag,
        } => run_add(ctx, &project, Dependency::new(predecessor, successor).with_lag(lag)),
        DepCommands::Remove {
            project,
            predecessor,
            successor,
        } => run_remove(ctx, &project, &predecessor, &successor),
    };
    finish(result, ctx.json)
}

fn run_add(ctx: &Context, project: &str, dep: Dependency) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    engine.add_dependency(&key, &dep)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({ "added": dep })));
    } else {
        println!(
            "Added {} -> {} (lag {}m)",
            dep.predecessor_id, dep.successor_id, dep.lag_minutes
        );
    }
    Ok(0)
}

fn run_remove(ctx: &Context, project: &str, predecessor: &str, successor: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    engine.store().transaction(|conn| {
        project_repo::get_project(conn, &key)?;
        dependency_repo::remove_dependency(conn, &key.project_id, predecessor, successor)
    })?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "removed": { "predecessor_id": predecessor, "successor_id": successor }
        })));
    } else {
        println!("Removed {predecessor} -> {successor}");
    }
    Ok(0)
}
