pub mod baseline;
pub mod commands;
pub mod context;
pub mod dep;
pub mod ev;
pub mod init;
pub mod project;
pub mod recompute;
pub mod task;

pub use commands::*;
pub use context::Context;

use crate::error::Result;
use crate::output;

/// Turn a handler result into an exit code, printing the error envelope on
/// failure.
pub fn finish(result: Result<i32>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                eprintln!("Error: {e}");
            }
            1
        }
    }
}
