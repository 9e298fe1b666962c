//! The bootstrap run: inventory → queue → pool → report.

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use fleetkit::runner::redact_password;
use fleetkit::{
    Buckets, Classification, CommandBuilder, Credentials, Host, KnifeBootstrap, PoolError, Report,
    RunSummary, ShellRunner, TaskQueue, WorkerPool, inventory,
};
use std::fs;

use crate::Context;
use crate::cli::Cli;
use crate::config::Config;
use crate::logs::{self, LogObserver};
use crate::paths;
use crate::progress;
use crate::ui;

/// How a run ended, short of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every host bootstrapped
    Clean,
    /// At least one host failed; the report was printed
    HostsFailed,
    /// Nothing was executed
    DryRun,
}

pub fn run(ctx: &Context, cli: &Cli) -> Result<RunStatus> {
    let config = Config::load(cli.config.as_deref())?;

    let inventory_path = paths::expand(&cli.file);
    let hosts = inventory::load(&inventory_path)
        .with_context(|| format!("Invalid inventory {}", inventory_path.display()))?;

    if hosts.is_empty() {
        if !ctx.quiet {
            ui::info(&format!("No hosts in {}", inventory_path.display()));
        }
        return Ok(RunStatus::Clean);
    }

    let knife = KnifeBootstrap {
        tool: config.tool.clone(),
        sudo: config.sudo,
        credentials: Credentials {
            user: cli.ssh_user.clone(),
            password: cli.ssh_password.clone(),
        },
    };

    if cli.dry_run {
        dry_run(ctx, &hosts, &knife);
        return Ok(RunStatus::DryRun);
    }

    for host in &hosts {
        println!("Queueing: {}", serde_json::to_string(host)?);
    }
    let queue = TaskQueue::from_hosts(hosts)?;

    let log_dir = config.log_dir(cli.log_dir.as_deref());
    logs::ensure_dir(&log_dir)?;

    let pool = WorkerPool::new(config.pool_options(cli.jobs));
    let workers = pool.options().worker_count(queue.len());
    log::info!(
        "Bootstrapping {} with up to {workers} workers",
        ui::hosts(queue.len())
    );
    if ctx.verbose > 0 && !ctx.quiet {
        ui::header("Bootstrap");
        ui::kv("Inventory", &inventory_path.display().to_string());
        ui::kv("Hosts", &queue.len().to_string());
        ui::kv("Workers", &workers.to_string());
        ui::kv("Logs", &log_dir.display().to_string());
        println!();
    }

    let pb = progress::bar(queue.len() as u64, "Bootstrapping", ctx.quiet);
    let observer = LogObserver::new(log_dir, pb.clone());
    let result = pool.run(&queue, &knife, &ShellRunner::new(), &observer);
    pb.finish_and_clear();

    if observer.write_errors() > 0 {
        ui::warn(&format!(
            "Could not write {} log files",
            observer.write_errors()
        ));
    }

    let buckets = match result {
        Ok(buckets) => buckets,
        Err(PoolError::Infrastructure {
            host,
            source,
            abandoned,
            partial,
        }) => {
            ui::error(&format!("Could not start the bootstrap for {host}: {source}"));
            if !abandoned.is_empty() {
                ui::error(&format!("Run aborted, {} not attempted", ui::hosts(abandoned.len())));
            }
            emit_report(cli, &partial)?;
            anyhow::bail!("Bootstrap aborted after infrastructure failure on {host}");
        }
        Err(e) => return Err(e.into()),
    };

    let summary = buckets.summary();
    if !ctx.quiet {
        print_summary(&summary);
    }

    if emit_report(cli, &buckets)? {
        Ok(RunStatus::HostsFailed)
    } else {
        Ok(RunStatus::Clean)
    }
}

/// Print the report if any host failed; returns whether one was printed.
fn emit_report(cli: &Cli, buckets: &Buckets) -> Result<bool> {
    let Some(report) = Report::build(buckets) else {
        return Ok(false);
    };

    let json = report.to_json_pretty()?;
    println!("{}", "Error Report:".red().bold());
    println!("{json}");

    if let Some(path) = &cli.report {
        let path = paths::expand(path);
        fs::write(&path, &json)
            .with_context(|| format!("Could not write report to {}", path.display()))?;
        ui::dim(&format!("Report written to {}", path.display()));
    }

    Ok(true)
}

/// Print each host's command; with `--quiet` only the commands.
fn dry_run(ctx: &Context, hosts: &[Host], knife: &KnifeBootstrap) {
    if ctx.quiet {
        for command in dry_run_commands(hosts, knife) {
            println!("{command}");
        }
        return;
    }

    ui::header("Dry run");
    ui::kv("Hosts", &hosts.len().to_string());
    println!();
    for command in dry_run_commands(hosts, knife) {
        println!("  {} {command}", "→".cyan());
    }
    println!();
    ui::warn("Dry run - no commands were executed");
}

fn dry_run_commands(hosts: &[Host], knife: &KnifeBootstrap) -> Vec<String> {
    hosts
        .iter()
        .map(|host| redact_password(&knife.build(host)))
        .collect()
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.is_success() {
        ui::success(&format!("Bootstrapped {} successfully!", ui::hosts(summary.total())));
        return;
    }

    ui::warn(&format!(
        "Bootstrapped {}, {} failed",
        ui::hosts(summary.succeeded),
        summary.failed()
    ));
    for (classification, count) in [
        (Classification::DnsFailure, summary.dns),
        (Classification::AuthFailure, summary.auth),
        (Classification::TimeoutFailure, summary.timeout),
        (Classification::GeneralFailure, summary.general),
        (Classification::ToolFailure, summary.tool),
    ] {
        if count > 0 {
            println!("    • {} {}", count, classification.description().red());
        }
    }
    println!();
}
