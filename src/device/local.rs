// file: src/device/local.rs
// version: 1.0.0
// guid: 774a523e-d319-42c3-a558-c8a90306b169

//! Local shell for installing into a system tree mounted on this machine

use super::command::{Elevation, ShellCommand};
use super::executor::{capture, CommandOutput, RemoteShell};
use crate::Result;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Shell that mimics [`super::AdbShell`] against the host filesystem
pub struct LocalShell {
    elevation: Elevation,
}

impl LocalShell {
    /// Create a local shell; host commands are not elevated by default
    pub fn new() -> Self {
        Self {
            elevation: Elevation::None,
        }
    }

    pub fn with_elevation(elevation: Elevation) -> Self {
        Self { elevation }
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteShell for LocalShell {
    fn name(&self) -> &str {
        "local"
    }

    fn elevation(&self) -> Elevation {
        self.elevation
    }

    async fn run(&mut self, command: &ShellCommand, timeout: Duration) -> Result<CommandOutput> {
        let line = command.render(self.elevation);
        debug!("Executing local command: {}", line);

        let mut sh = Command::new("sh");
        sh.arg("-c").arg(line);
        capture(sh, timeout).await
    }

    async fn push(
        &mut self,
        local: &Path,
        remote_path: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        info!("Local mode: copying {} to {}", local.display(), remote_path);

        match tokio::time::timeout(timeout, tokio::fs::copy(local, remote_path)).await {
            Ok(Ok(bytes)) => Ok(CommandOutput::exited(
                0,
                format!("{}: 1 file pushed, {} bytes", local.display(), bytes),
                "",
            )),
            Ok(Err(e)) => Ok(CommandOutput::exited(
                1,
                "",
                format!("cannot copy to {}: {}", remote_path, e),
            )),
            Err(_) => Ok(CommandOutput::timed_out(timeout)),
        }
    }

    async fn remount(&mut self, _timeout: Duration) -> Result<CommandOutput> {
        Ok(CommandOutput::exited(
            1,
            "",
            "remount is not available on the local shell",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_push_copies_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.0");
        std::fs::write(&source, b"-----BEGIN CERTIFICATE-----\n").unwrap();
        let target = dir.path().join("b.0");

        let mut shell = LocalShell::new();
        let output = shell
            .push(&source, target.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(std::fs::read(&target).unwrap(), b"-----BEGIN CERTIFICATE-----\n");
    }

    #[tokio::test]
    async fn test_local_push_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.0");
        std::fs::write(&source, b"x").unwrap();
        let target = dir.path().join("missing").join("a.0");

        let mut shell = LocalShell::new();
        let output = shell
            .push(&source, target.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(1));
        assert!(output.stderr.contains("cannot copy"));
    }

    #[tokio::test]
    async fn test_local_remount_unsupported() {
        let mut shell = LocalShell::new();
        let output = shell.remount(Duration::from_secs(1)).await.unwrap();
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_local_run_reports_exit_code() {
        let mut shell = LocalShell::new();
        let output = shell
            .run(&ShellCommand::new("ls").arg("/nonexistent-dir-for-test"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success());
    }
}
