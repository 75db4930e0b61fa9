// file: src/device/discovery.rs
// version: 1.0.0
// guid: a3ddf6d5-7995-4a90-aa4d-79809d484112

//! adb host checks and device listing

use super::executor::capture;
use crate::{CertAgentError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// One line of `adb devices -l`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub state: String,
    pub details: Option<String>,
}

impl DeviceInfo {
    /// Ready for shell commands
    pub fn is_online(&self) -> bool {
        self.state == "device"
    }
}

/// Locate the adb binary, either as configured or on `PATH`
pub fn resolve_adb(configured: &str) -> Result<PathBuf> {
    let candidate = Path::new(configured);
    if candidate.components().count() > 1 {
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
        return Err(CertAgentError::device(format!(
            "adb not found at {}",
            candidate.display()
        )));
    }

    which::which(configured).map_err(|_| {
        CertAgentError::device(
            "ADB is not installed or not in PATH. Please install Android SDK Platform Tools.",
        )
    })
}

/// Host-side adb operations that do not target a single device
pub struct AdbHost {
    adb: PathBuf,
    timeout: Duration,
}

impl AdbHost {
    pub fn new(adb: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            adb: adb.into(),
            timeout,
        }
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    /// Return the first line of `adb --version`
    pub async fn version(&self) -> Result<String> {
        let mut command = Command::new(&self.adb);
        command.arg("--version");
        let output = capture(command, self.timeout).await?;

        if !output.success() {
            return Err(CertAgentError::device(format!(
                "adb --version failed: {}",
                output.stderr.trim()
            )));
        }

        Ok(output.stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// List attached devices in any state
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut command = Command::new(&self.adb);
        command.args(["devices", "-l"]);
        let output = capture(command, self.timeout).await?;

        if !output.success() {
            return Err(CertAgentError::device(format!(
                "Error checking ADB devices: {}",
                output.stderr.trim()
            )));
        }

        let devices = parse_devices(&output.stdout);
        debug!("adb reported {} device(s)", devices.len());
        Ok(devices)
    }

    /// Devices ready for shell commands
    pub async fn online_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self.devices().await?;
        for device in devices.iter().filter(|d| !d.is_online()) {
            warn!("Skipping {} ({})", device.serial, device.state);
        }
        Ok(devices.into_iter().filter(DeviceInfo::is_online).collect())
    }
}

/// Parse the output of `adb devices [-l]`
pub fn parse_devices(text: &str) -> Vec<DeviceInfo> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*')
        })
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?.to_string();
            let state = parts.next()?.to_string();
            let rest: Vec<&str> = parts.collect();
            let details = if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            };
            Some(DeviceInfo {
                serial,
                state,
                details,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_long_format() {
        let text = "List of devices attached\n\
                    emulator-5554          device product:sdk_gphone64_x86_64 model:sdk_gphone64_x86_64 transport_id:1\n\
                    R58M123ABC             offline transport_id:2\n\
                    \n";

        let devices = parse_devices(text);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "emulator-5554");
        assert!(devices[0].is_online());
        assert!(devices[0].details.as_deref().unwrap().contains("model:sdk_gphone64_x86_64"));
        assert_eq!(devices[1].state, "offline");
        assert!(!devices[1].is_online());
    }

    #[test]
    fn test_parse_devices_short_format_and_daemon_noise() {
        let text = "* daemon not running; starting now at tcp:5037\n\
                    * daemon started successfully\n\
                    List of devices attached\n\
                    0123456789ABCDEF\tunauthorized\n";

        let devices = parse_devices(text);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].state, "unauthorized");
        assert_eq!(devices[0].details, None);
    }

    #[test]
    fn test_parse_devices_empty() {
        assert!(parse_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn test_resolve_adb_missing_explicit_path() {
        let result = resolve_adb("/nonexistent/platform-tools/adb");
        assert!(result.is_err());
    }
}
