//! Job command execution
//!
//! Executes shell commands with optional timeout.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::JobSpec;
use crate::error::{Result, ScheduleError};

/// Maximum allowed timeout (10 minutes)
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Outcome of a single job invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Exit code of the command
    pub exit_code: Option<i32>,
    /// Whether the command timed out
    pub timed_out: bool,
}

impl RunOutcome {
    /// Whether the invocation completed with exit code 0
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Pretty-printed outcome for log output
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Callback seam for scheduled jobs
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Invoke the job once and report the outcome
    async fn run(&self, job: &JobSpec) -> Result<RunOutcome>;
}

/// Runs a job's command through a shell
pub struct CommandRunner {
    shell: String,
    timeout_ms: u64,
}

impl CommandRunner {
    /// Create a runner with the given shell and timeout
    pub fn new(shell: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            shell: shell.into(),
            // Limit timeout to 10 minutes max
            timeout_ms: timeout_ms.min(MAX_TIMEOUT_MS),
        }
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new("bash", 120_000)
    }
}

#[async_trait]
impl JobRunner for CommandRunner {
    async fn run(&self, job: &JobSpec) -> Result<RunOutcome> {
        let duration = Duration::from_millis(self.timeout_ms);

        tracing::debug!(
            job = %job.name,
            command = %job.command,
            timeout_ms = self.timeout_ms,
            "Executing job command"
        );

        // Execute the command with timeout
        let result = timeout(
            duration,
            Command::new(&self.shell)
                .arg("-c")
                .arg(&job.command)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                Ok(RunOutcome {
                    stdout,
                    stderr,
                    exit_code: output.status.code(),
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(ScheduleError::JobExecution(format!(
                "Failed to execute command: {}",
                e
            ))),
            Err(_) => Ok(RunOutcome {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                timed_out: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(command: &str) -> JobSpec {
        JobSpec {
            name: "test".to_string(),
            rule: "* * * * *".to_string(),
            command: command.to_string(),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_command_echo() {
        let runner = CommandRunner::default();
        let outcome = runner.run(&job("echo hello")).await.unwrap();

        assert!(outcome.success());
        assert!(outcome.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_command_failure() {
        let runner = CommandRunner::default();
        let outcome = runner.run(&job("exit 1")).await.unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let runner = CommandRunner::new("bash", 100);
        let outcome = runner.run(&job("sleep 10")).await.unwrap();

        assert!(!outcome.success());
        assert!(outcome.timed_out);
    }

    #[test]
    fn test_timeout_is_capped() {
        let runner = CommandRunner::new("bash", u64::MAX);
        assert_eq!(runner.timeout_ms, MAX_TIMEOUT_MS);
    }
}
