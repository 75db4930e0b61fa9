// file: src/device/adb.rs
// version: 1.0.0
// guid: e75ca453-1fde-4cc0-89f2-11ceda8c56c4

//! Remote shell over the Android Debug Bridge

use super::command::{Elevation, ShellCommand};
use super::executor::{capture, CommandOutput, RemoteShell};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Shell on one device, driven through the `adb` binary
pub struct AdbShell {
    adb: PathBuf,
    serial: Option<String>,
    elevation: Elevation,
    label: String,
}

impl AdbShell {
    /// Create a shell for `serial`, or for the only attached device when `None`
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>, elevation: Elevation) -> Self {
        let label = match &serial {
            Some(serial) => format!("adb:{}", serial),
            None => "adb".to_string(),
        };

        Self {
            adb: adb.into(),
            serial,
            elevation,
            label,
        }
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn adb_command(&self) -> Command {
        let mut command = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
    }

    /// Reboot the device
    pub async fn reboot(&mut self, timeout: Duration) -> Result<CommandOutput> {
        info!("Rebooting {}", self.label);
        let mut command = self.adb_command();
        command.arg("reboot");
        capture(command, timeout).await
    }
}

#[async_trait::async_trait]
impl RemoteShell for AdbShell {
    fn name(&self) -> &str {
        &self.label
    }

    fn elevation(&self) -> Elevation {
        self.elevation
    }

    async fn run(&mut self, command: &ShellCommand, timeout: Duration) -> Result<CommandOutput> {
        let line = command.render(self.elevation);
        debug!("{} shell: {}", self.label, line);

        let mut adb = self.adb_command();
        adb.arg("shell").arg(line);
        capture(adb, timeout).await
    }

    async fn push(
        &mut self,
        local: &Path,
        remote_path: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        debug!("{} push {} -> {}", self.label, local.display(), remote_path);

        let mut adb = self.adb_command();
        adb.arg("push").arg(local).arg(remote_path);
        capture(adb, timeout).await
    }

    async fn remount(&mut self, timeout: Duration) -> Result<CommandOutput> {
        debug!("{} remount", self.label);

        let mut adb = self.adb_command();
        adb.arg("remount");
        capture(adb, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_includes_serial() {
        let shell = AdbShell::new("adb", Some("emulator-5554".to_string()), Elevation::Su);
        assert_eq!(shell.name(), "adb:emulator-5554");
        assert_eq!(shell.serial(), Some("emulator-5554"));

        let shell = AdbShell::new("adb", None, Elevation::SuRoot);
        assert_eq!(shell.name(), "adb");
        assert_eq!(shell.elevation(), Elevation::SuRoot);
    }

    #[tokio::test]
    async fn test_missing_adb_binary_is_fatal() {
        let mut shell = AdbShell::new("/nonexistent/platform-tools/adb", None, Elevation::Su);
        let result = shell
            .run(&ShellCommand::new("id"), Duration::from_secs(1))
            .await;
        assert!(result.is_err());
    }
}
