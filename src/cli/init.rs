use serde_json::json;

use crate::cli::{finish, Context};
use crate::db::Store;
use crate::output;

pub fn run(ctx: &Context) -> i32 {
    let result = Store::init(&ctx.db_path).map(|_| {
        if ctx.json {
            output::json::print(&output::json::success(json!({
                "path": ctx.db_path.to_string_lossy()
            })));
        } else {
            println!("Initialized critpath at {}", ctx.db_path.display());
        }
        0
    });
    finish(result, ctx.json)
}
