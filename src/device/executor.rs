// file: src/device/executor.rs
// version: 1.0.0
// guid: ff7ac813-a033-4bcc-ab04-c737df69e6cb

//! Remote shell trait shared by the adb and local transports

use super::command::{Elevation, ShellCommand};
use crate::{CertAgentError, Result};
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured outcome of one remote call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed or timed out
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    /// An output with the given exit code
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// The output of a call abandoned after `timeout`
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs_f32()),
            timed_out: true,
        }
    }

    pub fn from_output(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: false,
        }
    }

    /// Exit code 0 within the time limit
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// A command channel to a single device
///
/// Implementations return `Err` only when the transport itself cannot be
/// used (for example the `adb` binary cannot be spawned). A command that runs
/// and fails, or that times out, comes back as `Ok` with a failing
/// [`CommandOutput`].
#[async_trait::async_trait]
pub trait RemoteShell: Send {
    /// Short label used in logs, such as `adb:emulator-5554`
    fn name(&self) -> &str;

    /// Superuser convention applied to elevated commands
    fn elevation(&self) -> Elevation;

    /// Run a command on the target
    async fn run(&mut self, command: &ShellCommand, timeout: Duration) -> Result<CommandOutput>;

    /// Copy a local file to `remote_path` with the transport's native primitive
    async fn push(&mut self, local: &Path, remote_path: &str, timeout: Duration)
        -> Result<CommandOutput>;

    /// Ask the transport to remount system partitions read-write
    async fn remount(&mut self, timeout: Duration) -> Result<CommandOutput>;
}

/// Spawn `command`, wait for it up to `timeout` and capture its output
///
/// The child is killed when the timeout fires.
pub(crate) async fn capture(mut command: Command, timeout: Duration) -> Result<CommandOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = command.as_std().get_program().to_string_lossy().to_string();

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => {
            let output = CommandOutput::from_output(output);
            debug!("{} exited with {:?}", program, output.exit_code);
            Ok(output)
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(CertAgentError::shell(
            format!("{} not found: {}", program, e),
        )),
        Ok(Err(e)) => Err(CertAgentError::shell(format!(
            "Failed to execute {}: {}",
            program, e
        ))),
        Err(_) => {
            debug!("{} timed out after {:?}", program, timeout);
            Ok(CommandOutput::timed_out(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_requires_zero_exit() {
        assert!(CommandOutput::exited(0, "", "").success());
        assert!(!CommandOutput::exited(1, "", "Read-only file system").success());
        assert!(!CommandOutput::timed_out(Duration::from_secs(5)).success());
    }

    #[test]
    fn test_timed_out_output() {
        let output = CommandOutput::timed_out(Duration::from_secs(10));
        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        assert!(output.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_capture_runs_process() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo hello; echo oops >&2; exit 3"]);

        let output = capture(command, Duration::from_secs(5)).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_capture_times_out() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);

        let output = capture(command, Duration::from_millis(100)).await.unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_capture_missing_binary_is_transport_error() {
        let command = Command::new("/nonexistent/adb-binary");
        let result = capture(command, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(CertAgentError::Shell(_))));
    }
}
