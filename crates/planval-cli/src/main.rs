//! Synchronous entry point for the plan validator (spec.md §1 "out of
//! scope": the GUI shell, token cache, and installer stay external; this
//! binary is the thing they would shell out to / link against).

mod cli;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Route the parsed command. Returns the process exit code: spec.md §6 ties
/// it directly to the run's verdict for `validate`, and to plain success for
/// the read-only subcommands.
fn dispatch(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Validate(args) => cli::validate::run(args),
        Command::LatestVersion(args) => cli::latest_version::run(args),
    }
}
