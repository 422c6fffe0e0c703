//! Process execution for adb invocations
//!
//! Every higher-level operation funnels through [`CommandRunner::run`]. The
//! runner reports what the process printed and leaves the decision about
//! success to the caller, since adb signals failure in stdout text for some
//! sub-commands and through the exit status for others.

pub mod mock;

use crate::error::{AdbError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Timeout for quick queries (devices, input, settings, ...)
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for slower operations (tcpip, monkey, dumpsys, pull, ...)
pub const LONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured output of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecutionResult {
    /// Build a result from text output, mostly useful for fixtures
    pub fn from_output(exit_status: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            exit_status: Some(exit_status),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout followed by stderr, decoded lossily
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout_lossy(), self.stderr_lossy())
    }

    /// Strictly decoded stdout
    pub fn stdout_utf8(&self) -> Result<String> {
        Ok(String::from_utf8(self.stdout.clone())?)
    }
}

/// Runs adb with a list of arguments
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run adb with `args` (everything after the binary name)
    ///
    /// Fails with [`AdbError::Timeout`] when the process outlives `timeout` and
    /// with [`AdbError::CommandFailed`] when it cannot be spawned. Any exit
    /// status is otherwise returned as-is.
    async fn run(&self, args: &[String], timeout: Duration) -> Result<ExecutionResult>;
}

/// Build adb arguments with an optional device specifier
pub fn adb_args(device_id: Option<&str>, args: &[&str]) -> Vec<String> {
    let mut full = Vec::with_capacity(args.len() + 2);
    if let Some(id) = device_id {
        full.push("-s".to_string());
        full.push(id.to_string());
    }
    full.extend(args.iter().map(|a| a.to_string()));
    full
}

/// Production runner that spawns the adb binary
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    adb_path: String,
}

impl ProcessExecutor {
    /// Create an executor that runs `adb` from `PATH`
    pub fn new() -> Self {
        Self {
            adb_path: "adb".to_string(),
        }
    }

    /// Create an executor with a custom adb binary
    pub fn with_path(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    /// Run an arbitrary program under the executor's timeout rules
    pub async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ExecutionResult> {
        debug!("exec: {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdbError::CommandFailed(format!("failed to spawn {}: {}", program, e)))?;

        // On timeout the wait future is dropped along with the child, and
        // kill_on_drop terminates the process.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AdbError::Timeout(format!(
                    "{} {} timed out after {:.1}s",
                    program,
                    args.first().map(String::as_str).unwrap_or(""),
                    timeout.as_secs_f64()
                ))
            })??;

        debug!("exit: {:?}", output.status.code());

        Ok(ExecutionResult {
            exit_status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ProcessExecutor {
    async fn run(&self, args: &[String], timeout: Duration) -> Result<ExecutionResult> {
        self.execute(&self.adb_path, args, timeout).await
    }
}
