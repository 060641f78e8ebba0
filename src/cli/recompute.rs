use std::sync::Arc;

use crate::cli::{finish, Context};
use crate::coordinator::{RecomputeCoordinator, RecomputeState, TriggerReason};
use crate::error::{EngineError, Result};
use crate::output;

pub fn run(project: &str, ctx: &Context) -> i32 {
    finish(run_recompute(ctx, project), ctx.json)
}

fn run_recompute(ctx: &Context, project: &str) -> Result<i32> {
    let engine = Arc::new(ctx.engine()?);
    let key = ctx.project_key(&engine, project)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| EngineError::validation(format!("Cannot start runtime: {e}")))?;
    let coordinator = RecomputeCoordinator::new(Arc::clone(&engine), runtime.handle().clone());
    let state = runtime.block_on(async {
        coordinator.trigger(&key, TriggerReason::Manual);
        coordinator.settled(&key).await
    });

    if let RecomputeState::Failed(reason) = state {
        return Err(coordinator
            .last_error(&key)
            .unwrap_or(EngineError::Validation(reason)));
    }
    let result = coordinator
        .last_result(&key)
        .ok_or_else(|| EngineError::validation("Recompute finished without a result"))?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::schedule_json(&result)));
    } else {
        output::text::print_schedule(&result);
    }
    Ok(0)
}
