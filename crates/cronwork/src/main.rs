//! cronwork: Cron Job Runner Main Binary
//!
//! Main entry point for the cronwork daemon.
//!
//! Usage:
//!   cronwork             - Start daemon mode (run scheduled jobs)
//!   cronwork --check     - Validate the jobs file and show next occurrences
//!   cronwork --help      - Show help

use std::sync::Arc;

use cw_core::Config;
use cw_schedule::{CommandRunner, JobsConfig, Scheduler, next_occurrence};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Daemon mode (run scheduled jobs)
    Run,
    /// Validate the jobs file and print next occurrences
    Check,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let mode = parse_args();

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("cronwork {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse()?)
        )
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    // Load job definitions
    let jobs = match &config.scheduler.config_path {
        Some(path) => JobsConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load jobs file {}: {}", path, e))?,
        None => JobsConfig::load_default()
            .map_err(|e| anyhow::anyhow!("Failed to load jobs file: {}", e))?,
    };

    // Reject bad rules at startup, not at first fire
    jobs.validate()
        .map_err(|e| anyhow::anyhow!("Invalid jobs file: {}", e))?;

    match mode {
        RunMode::Check => run_check(&jobs),
        RunMode::Run => run_daemon(config, jobs).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--check" | "-C" => return RunMode::Check,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Run
}

/// Print help message
fn print_help() {
    println!("cronwork - Cron Job Runner");
    println!();
    println!("Usage:");
    println!("  cronwork             Start daemon mode (run scheduled jobs)");
    println!("  cronwork --check     Validate the jobs file and show next occurrences");
    println!("  cronwork --help      Show this help message");
    println!("  cronwork --version   Show version");
    println!();
    println!("Environment Variables:");
    println!("  SCHEDULE_ENABLED     Enable the scheduler (default: true)");
    println!("  SCHEDULE_CONFIG_PATH Path to the jobs file (default: jobs.toml)");
    println!("  RUNNER_SHELL         Shell used to run job commands (default: bash)");
    println!("  RUNNER_TIMEOUT_MS    Per-job command timeout (default: 120000)");
}

/// Validate jobs and print each job's next occurrence
fn run_check(jobs: &JobsConfig) -> anyhow::Result<()> {
    if jobs.jobs.is_empty() {
        println!("No jobs configured");
        return Ok(());
    }

    for job in &jobs.jobs {
        let next = next_occurrence(&job.rule)
            .map_err(|e| anyhow::anyhow!("Job {}: {}", job.name, e))?;

        let state = if job.enabled { "enabled" } else { "disabled" };
        match next {
            Some(t) => println!(
                "{:<20} {:<16} {}  next: {}",
                job.name,
                job.rule,
                state,
                t.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("{:<20} {:<16} {}  next: never", job.name, job.rule, state),
        }
    }

    Ok(())
}

/// Run daemon mode
async fn run_daemon(config: Config, jobs: JobsConfig) -> anyhow::Result<()> {
    if !config.scheduler.enabled {
        tracing::info!("Scheduler is disabled, nothing to do");
        return Ok(());
    }

    let enabled_count = jobs.enabled_jobs().len();
    if enabled_count == 0 {
        tracing::warn!("No enabled jobs found");
    }

    tracing::info!("Starting cronwork...");
    tracing::info!("Loaded {} jobs ({} enabled)", jobs.jobs.len(), enabled_count);

    let runner = Arc::new(CommandRunner::new(
        &config.runner.shell,
        config.runner.timeout_ms,
    ));

    let handle = Scheduler::new(jobs, runner).start();

    tracing::info!("cronwork initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    handle.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
