//! Time-bounded subprocess execution

use crate::error::{FleetError, FleetResult};
use crate::observability::FleetMetrics;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one external program with captured output and a hard timeout.
///
/// Spawn failures, timeouts and (for [`CommandRunner::run`]) non-zero exits
/// all become `UpstreamUnavailable`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    prefix_args: Vec<String>,
    tool: String,
    metrics: FleetMetrics,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let tool = Path::new(&program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());

        Self {
            program,
            prefix_args: Vec::new(),
            tool,
            metrics: FleetMetrics::new(),
        }
    }

    /// Arguments placed before every invocation's own arguments
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Label used in metrics and error messages
    pub fn with_tool_label(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Count a failure detected by the caller from a finished process
    pub fn record_failure(&self) {
        self.metrics.inc_upstream_failures(&self.tool);
    }

    /// Run and return the output whatever the exit status
    pub async fn run_unchecked(&self, args: &[String], timeout: Duration) -> FleetResult<CommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(tool = %self.tool, args = ?args, "Running upstream command");

        let started = Instant::now();
        let result = tokio::time::timeout(timeout, cmd.output()).await;
        self.metrics
            .observe_upstream_call(&self.tool, started.elapsed().as_secs_f64());

        match result {
            Ok(Ok(output)) => Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => {
                self.record_failure();
                Err(FleetError::upstream(format!("failed to run {}: {}", self.tool, e)))
            }
            Err(_) => {
                self.record_failure();
                Err(FleetError::upstream(format!(
                    "{} timed out after {}s",
                    self.tool,
                    timeout.as_secs_f64()
                )))
            }
        }
    }

    /// Run and require a zero exit status
    pub async fn run(&self, args: &[String], timeout: Duration) -> FleetResult<CommandOutput> {
        let output = self.run_unchecked(args, timeout).await?;
        if output.success() {
            return Ok(output);
        }

        self.record_failure();
        Err(FleetError::upstream(self.exit_message(&output)))
    }

    /// Human-readable description of a non-zero exit
    pub fn exit_message(&self, output: &CommandOutput) -> String {
        let status = output
            .code
            .map(|c| format!("exit code {}", c))
            .unwrap_or_else(|| "a signal".to_string());
        let stderr = output.stderr.trim();

        if stderr.is_empty() {
            format!("{} terminated with {}", self.tool, status)
        } else {
            format!("{} terminated with {}: {}", self.tool, status, stderr)
        }
    }
}
