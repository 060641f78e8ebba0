use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::cli::commands::EvCommands;
use crate::cli::{finish, Context};
use crate::error::Result;
use crate::output;

pub fn run(cmd: EvCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        EvCommands::Compute { project, as_of } => run_compute(ctx, &project, as_of),
        EvCommands::Show { project, as_of } => run_show(ctx, &project, as_of),
        EvCommands::History { project } => run_history(ctx, &project),
    };
    finish(result, ctx.json)
}

fn run_compute(ctx: &Context, project: &str, as_of: NaiveDate) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let snapshot = engine.compute_earned_value(&key, as_of)?;

    if ctx.json {
        let data = snapshot
            .as_ref()
            .map(output::json::earned_value_json)
            .unwrap_or(Value::Null);
        output::json::print(&output::json::success(data));
    } else {
        match snapshot {
            Some(ref s) => output::text::print_earned_value(s),
            None => println!("No active baseline; earned value not computed."),
        }
    }
    Ok(0)
}

fn run_show(ctx: &Context, project: &str, as_of: NaiveDate) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let snapshot = engine.earned_value_on(&key, as_of)?;

    if ctx.json {
        let data = snapshot
            .as_ref()
            .map(output::json::earned_value_json)
            .unwrap_or(Value::Null);
        output::json::print(&output::json::success(data));
    } else {
        match snapshot {
            Some(ref s) => output::text::print_earned_value(s),
            None => println!("No earned value stored for {as_of}."),
        }
    }
    Ok(0)
}

fn run_history(ctx: &Context, project: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let history = engine.earned_value_history(&key)?;

    if ctx.json {
        let list: Vec<_> = history.iter().map(output::json::earned_value_json).collect();
        output::json::print(&output::json::success(json!({ "snapshots": list })));
    } else {
        output::text::print_earned_value_history(&history);
    }
    Ok(0)
}
