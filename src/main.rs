use clap::Parser;
use std::process;

use critpath::cli;
use critpath::cli::commands::{Cli, Commands};
use critpath::logging;

fn main() {
    let cli_args = Cli::parse();

    if let Err(e) = logging::init_logging(cli_args.log_level) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    let ctx = cli::Context {
        db_path: cli_args.db,
        config_path: cli_args.config,
        org: cli_args.org,
        workspace: cli_args.workspace,
        json: cli_args.json,
    };

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Project(cmd) => cli::project::run(cmd, &ctx),
        Commands::Task(cmd) => cli::task::run(cmd, &ctx),
        Commands::Dep(cmd) => cli::dep::run(cmd, &ctx),
        Commands::Recompute { project } => cli::recompute::run(&project, &ctx),
        Commands::Baseline(cmd) => cli::baseline::run(cmd, &ctx),
        Commands::Variance { project } => cli::baseline::run_variance(&project, &ctx),
        Commands::Ev(cmd) => cli::ev::run(cmd, &ctx),
    };

    process::exit(exit_code);
}
