use serde_json::json;

use crate::cli::commands::BaselineCommands;
use crate::cli::{finish, Context};
use crate::error::Result;
use crate::output;

pub fn run(cmd: BaselineCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        BaselineCommands::Create { project, name, by } => run_create(ctx, &project, &name, by.as_deref()),
        BaselineCommands::Activate { id } => run_activate(ctx, &id),
        BaselineCommands::List { project } => run_list(ctx, &project),
        BaselineCommands::Show { id } => run_show(ctx, &id),
        BaselineCommands::Purge { id } => run_purge(ctx, &id),
    };
    finish(result, ctx.json)
}

fn run_create(ctx: &Context, project: &str, name: &str, by: Option<&str>) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let baseline = engine.create_baseline(&key, name, by)?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::baseline_json(&baseline)));
    } else {
        println!("Created baseline: {} ({})", baseline.name, baseline.id);
    }
    Ok(0)
}

fn run_activate(ctx: &Context, id: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.baseline_key(&engine, id)?;
    let baseline = engine.activate_baseline(&key, id)?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::baseline_json(&baseline)));
    } else {
        println!("Activated baseline: {} ({})", baseline.name, baseline.id);
    }
    Ok(0)
}

fn run_list(ctx: &Context, project: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.project_key(&engine, project)?;
    let baselines = engine.list_baselines(&key)?;

    if ctx.json {
        let list: Vec<_> = baselines.iter().map(output::json::baseline_json).collect();
        output::json::print(&output::json::success(json!({ "baselines": list })));
    } else {
        output::text::print_baseline_list(&baselines);
    }
    Ok(0)
}

fn run_show(ctx: &Context, id: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.baseline_key(&engine, id)?;
    let baseline = engine
        .list_baselines(&key)?
        .into_iter()
        .find(|b| b.id == id);
    let items = engine.baseline_items(&key, id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "baseline": baseline.as_ref().map(output::json::baseline_json),
            "items": output::json::to_value(&items)
        })));
    } else {
        if let Some(ref b) = baseline {
            output::text::print_baseline(b);
        }
        for item in &items {
            println!(
                "  {}{} {} -> {} TF={}m",
                if item.critical_path { "*" } else { " " },
                item.task_id,
                item.planned_start.format("%Y-%m-%d %H:%M"),
                item.planned_end.format("%Y-%m-%d %H:%M"),
                item.total_float_minutes
            );
        }
    }
    Ok(0)
}

fn run_purge(ctx: &Context, id: &str) -> Result<i32> {
    let engine = ctx.engine()?;
    let key = ctx.baseline_key(&engine, id)?;
    engine.purge_baseline(&key, id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({ "purged": id })));
    } else {
        println!("Purged baseline {id}");
    }
    Ok(0)
}

pub fn run_variance(project: &str, ctx: &Context) -> i32 {
    let result = (|| -> Result<i32> {
        let engine = ctx.engine()?;
        let key = ctx.project_key(&engine, project)?;
        let variance = engine.baseline_variance(&key)?;

        if ctx.json {
            output::json::print(&output::json::success(json!({
                "variance": variance.as_ref().map(output::json::to_value)
            })));
        } else {
            match variance {
                Some(ref rows) => output::text::print_variance(rows),
                None => println!("No active baseline."),
            }
        }
        Ok(0)
    })();
    finish(result, ctx.json)
}
