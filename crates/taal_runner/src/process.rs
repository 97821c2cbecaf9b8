//! Process-based command runner.
//!
//! Spawns the program directly (no shell), with a cleared environment and
//! only the variables the [`CommandSpec`] names.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::{CommandSpec, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Process runner options.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
}

impl ProcessRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Runner that executes commands as local child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    options: ProcessRunnerOptions,
}

impl ProcessRunner {
    pub fn new(options: ProcessRunnerOptions) -> Self {
        Self { options }
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn build_command(spec: &CommandSpec) -> RunnerResult<Command> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .env_clear()
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &spec.workdir {
            if !dir.is_dir() {
                return Err(RunnerError::InvalidWorkdir(dir.display().to_string()));
            }
            cmd.current_dir(dir);
        }

        Ok(cmd)
    }

    fn log_lines(stream: &str, output: &str) {
        for line in output.lines() {
            debug!("[{}] {}", stream, line);
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        let status = Command::new(program)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        Ok(status.map(|s| s.success()).unwrap_or(false))
    }

    async fn version(&self, program: &str) -> RunnerResult<String> {
        let output = Command::new(program)
            .arg("version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|_| RunnerError::NotAvailable(program.to_string()))?;

        if !output.status.success() {
            return Err(RunnerError::ExecutionFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn run(&self, spec: &CommandSpec, run_config: &RunConfig) -> RunnerResult<ExecutionResult> {
        let cmd_str = spec.display();
        debug!("Executing: {}", cmd_str);

        if self.is_dry_run() {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            let now = Utc::now();
            return Ok(ExecutionResult {
                exit_code: 0,
                stdout: format!("[DRY-RUN] Command: {}", cmd_str),
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
            });
        }

        let mut cmd = Self::build_command(spec)?;

        let started_at = Utc::now();
        let child = cmd.spawn().map_err(|source| RunnerError::SpawnFailed {
            program: spec.program_name(),
            source,
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = if run_config.timeout_seconds > 0 {
            let timeout = Duration::from_secs(run_config.timeout_seconds);
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    error!(
                        "{} timed out after {}s",
                        spec.program_name(),
                        run_config.timeout_seconds
                    );
                    return Err(RunnerError::Timeout(run_config.timeout_seconds));
                }
            }
        } else {
            child.wait_with_output().await?
        };
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().map(i64::from).unwrap_or(-1);

        if run_config.stream_logs {
            Self::log_lines("stdout", &stdout);
            Self::log_lines("stderr", &stderr);
        }

        if exit_code == 0 {
            debug!("{} completed in {}ms", spec.program_name(), duration_ms);
        } else {
            error!(
                "{} failed with exit code {} after {}ms",
                spec.program_name(),
                exit_code,
                duration_ms
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}
