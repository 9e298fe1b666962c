mod bootstrap;
mod cli;
mod config;
mod logs;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use bootstrap::RunStatus;
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

/// Exit status with `--fail-on-errors` when any host failed
const HOSTS_FAILED_EXIT: u8 = 2;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match bootstrap::run(&ctx, &cli)? {
        RunStatus::HostsFailed if cli.fail_on_errors => Ok(ExitCode::from(HOSTS_FAILED_EXIT)),
        RunStatus::Clean | RunStatus::HostsFailed | RunStatus::DryRun => Ok(ExitCode::SUCCESS),
    }
}
