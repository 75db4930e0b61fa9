// file: src/installer/types.rs
// version: 1.0.1
// guid: d6853031-69ee-494b-b178-b4aa9fc94688

//! Request, result and attempt records for remote installs

use crate::device::CommandOutput;
use crate::{CertAgentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest stderr excerpt kept per attempt
const STDERR_SNIPPET_CHARS: usize = 200;

/// What to install and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    local_path: PathBuf,
    destination: String,
    mode: String,
}

impl InstallRequest {
    /// Build a request, checking the destination and permission mode
    pub fn new(
        local_path: impl Into<PathBuf>,
        destination: impl Into<String>,
        mode: impl Into<String>,
    ) -> Result<Self> {
        let local_path = local_path.into();
        let destination = destination.into();
        let mode = mode.into();

        if !destination.starts_with('/') || destination.ends_with('/') {
            return Err(CertAgentError::invalid_argument(format!(
                "Destination must be an absolute file path: {}",
                destination
            )));
        }

        let octal = !mode.is_empty() && mode.len() <= 4 && mode.chars().all(|c| ('0'..='7').contains(&c));
        if !octal {
            return Err(CertAgentError::invalid_argument(format!(
                "Permission mode must be octal, got {}",
                mode
            )));
        }

        Ok(Self {
            local_path,
            destination,
            mode,
        })
    }

    /// Install `local_path` into `directory`, keeping its file name
    pub fn into_directory(local_path: impl Into<PathBuf>, directory: &str, mode: &str) -> Result<Self> {
        let local_path = local_path.into();
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                CertAgentError::invalid_argument(format!(
                    "Not a file path: {}",
                    local_path.display()
                ))
            })?;

        let destination = format!("{}/{}", directory.trim_end_matches('/'), file_name);
        Self::new(local_path, destination, mode)
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Last path component of the destination
    pub fn file_name(&self) -> &str {
        self.destination
            .rsplit('/')
            .next()
            .unwrap_or(&self.destination)
    }

    /// Parent directory of the destination
    pub fn parent_dir(&self) -> &str {
        match self.destination.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.destination[..idx],
        }
    }
}

/// Transfer strategy that put the file in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMethod {
    DirectPush,
    TempCopyDd,
    TempCopyCat,
    TempCopyCp,
    ScriptFallback,
}

impl InstallMethod {
    /// Staged copy strategies in the order they are tried
    pub const STAGED_ORDER: [InstallMethod; 4] = [
        InstallMethod::TempCopyDd,
        InstallMethod::TempCopyCat,
        InstallMethod::TempCopyCp,
        InstallMethod::ScriptFallback,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            InstallMethod::DirectPush => "direct push",
            InstallMethod::TempCopyDd => "dd from staging copy",
            InstallMethod::TempCopyCat => "cat redirect from staging copy",
            InstallMethod::TempCopyCp => "cp from staging copy",
            InstallMethod::ScriptFallback => "pushed shell script",
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Step of the install sequence an attempt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "method", rename_all = "snake_case")]
pub enum InstallStep {
    RootProbe,
    Remount,
    ProbeDirectory,
    CreateDirectory,
    DirectPush,
    Stage,
    Copy(InstallMethod),
    Chmod,
    Verify,
    Cleanup,
}

impl InstallStep {
    /// Part of the staged transfer: the staging push or a copy out of it
    pub fn is_staged_transfer(&self) -> bool {
        matches!(self, InstallStep::Stage | InstallStep::Copy(_))
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::RootProbe => f.write_str("root probe"),
            InstallStep::Remount => f.write_str("remount"),
            InstallStep::ProbeDirectory => f.write_str("probe directory"),
            InstallStep::CreateDirectory => f.write_str("create directory"),
            InstallStep::DirectPush => f.write_str("direct push"),
            InstallStep::Stage => f.write_str("stage"),
            InstallStep::Copy(method) => write!(f, "copy ({})", method),
            InstallStep::Chmod => f.write_str("chmod"),
            InstallStep::Verify => f.write_str("verify"),
            InstallStep::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// One remote call made during an install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub step: InstallStep,
    /// Command line as sent, or a short description for transport primitives
    pub command: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub stderr_snippet: String,
}

impl AttemptRecord {
    pub fn from_output(step: InstallStep, command: impl Into<String>, output: &CommandOutput) -> Self {
        Self {
            step,
            command: command.into(),
            exit_code: output.exit_code,
            timed_out: output.timed_out,
            stderr_snippet: snippet(&output.stderr),
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

fn snippet(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.chars().count() <= STDERR_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(STDERR_SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Outcome of [`super::RemoteFileInstaller::install`]
#[derive(Debug, Clone, Serialize)]
pub struct InstallResult {
    pub destination: String,
    /// A transfer strategy reported exit code 0
    pub succeeded: bool,
    pub method_used: Option<InstallMethod>,
    /// The destination listing showed the file after the transfer
    pub verified: bool,
    pub permissions_set: bool,
    /// Advisory outcome of the root probe
    pub root_available: Option<bool>,
    pub remounted: bool,
    /// Set when the install stopped early, with the reason
    pub aborted: Option<String>,
    /// Listing of the destination captured during verification
    pub listing: Option<String>,
    /// Staging copy on the device, once the staging push succeeded
    pub staging_path: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub duration: Duration,
    pub diagnostic: Vec<AttemptRecord>,
}

impl InstallResult {
    pub(crate) fn new(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            succeeded: false,
            method_used: None,
            verified: false,
            permissions_set: false,
            root_available: None,
            remounted: false,
            aborted: None,
            listing: None,
            staging_path: None,
            started_at: chrono::Utc::now(),
            duration: Duration::ZERO,
            diagnostic: Vec::new(),
        }
    }

    /// Attempts of the staged transfer, in order
    pub fn staged_attempts(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.diagnostic
            .iter()
            .filter(|record| record.step.is_staged_transfer())
    }

    /// Staged copy strategies that were tried, in order
    pub fn copy_methods_attempted(&self) -> Vec<InstallMethod> {
        self.diagnostic
            .iter()
            .filter_map(|record| match record.step {
                InstallStep::Copy(method) => Some(method),
                _ => None,
            })
            .collect()
    }

    /// Attempts for one step
    pub fn attempts_for(&self, step: InstallStep) -> Vec<&AttemptRecord> {
        self.diagnostic
            .iter()
            .filter(|record| record.step == step)
            .collect()
    }

    /// Failed remote calls, in order
    pub fn failures(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.diagnostic.iter().filter(|record| !record.succeeded())
    }

    /// Installed but the listing did not confirm it
    pub fn is_unverified(&self) -> bool {
        self.succeeded && !self.verified
    }

    /// Turn an aborted staging push into a [`CertAgentError::StagingTransfer`]
    pub fn into_result(self) -> Result<Self> {
        if self.aborted.is_none() {
            return Ok(self);
        }

        let stage = self
            .diagnostic
            .iter()
            .rev()
            .find(|record| record.step == InstallStep::Stage);

        match stage {
            Some(record) if !record.succeeded() => Err(CertAgentError::StagingTransfer {
                file: self
                    .destination
                    .rsplit('/')
                    .next()
                    .unwrap_or(&self.destination)
                    .to_string(),
                remote_path: record
                    .command
                    .rsplit(' ')
                    .next()
                    .unwrap_or(&record.command)
                    .to_string(),
                stderr: record.stderr_snippet.clone(),
                attempts: self.diagnostic.len(),
            }),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_paths() {
        let request = InstallRequest::new(
            "9a5ba575.0",
            "/system/etc/security/cacerts/9a5ba575.0",
            "644",
        )
        .unwrap();

        assert_eq!(request.file_name(), "9a5ba575.0");
        assert_eq!(request.parent_dir(), "/system/etc/security/cacerts");
        assert_eq!(request.mode(), "644");
    }

    #[test]
    fn test_request_into_directory() {
        let request = InstallRequest::into_directory(
            "certs/9a5ba575.0",
            "/system/etc/security/cacerts/",
            "644",
        )
        .unwrap();
        assert_eq!(request.destination(), "/system/etc/security/cacerts/9a5ba575.0");
    }

    #[test]
    fn test_request_rejects_relative_destination() {
        assert!(InstallRequest::new("a.0", "system/a.0", "644").is_err());
        assert!(InstallRequest::new("a.0", "/system/", "644").is_err());
    }

    #[test]
    fn test_request_rejects_bad_mode() {
        assert!(InstallRequest::new("a.0", "/system/a.0", "rw-r--r--").is_err());
        assert!(InstallRequest::new("a.0", "/system/a.0", "0644").is_ok());
        assert!(InstallRequest::new("a.0", "/system/a.0", "").is_err());
    }

    #[test]
    fn test_root_parent_dir() {
        let request = InstallRequest::new("a.0", "/a.0", "644").unwrap();
        assert_eq!(request.parent_dir(), "/");
    }

    #[test]
    fn test_snippet_truncates_long_stderr() {
        let output = CommandOutput::exited(1, "", "x".repeat(500));
        let record = AttemptRecord::from_output(InstallStep::Chmod, "chmod", &output);
        assert_eq!(record.stderr_snippet.chars().count(), STDERR_SNIPPET_CHARS + 3);
        assert!(!record.succeeded());
    }

    #[test]
    fn test_into_result_reports_staging_failure() {
        let mut result = InstallResult::new("/system/etc/security/cacerts/9a5ba575.0");
        result.diagnostic.push(AttemptRecord::from_output(
            InstallStep::Stage,
            "push 9a5ba575.0 /data/local/tmp/9a5ba575.0",
            &CommandOutput::exited(1, "", "No space left on device"),
        ));
        result.aborted = Some("staging push failed".to_string());

        let error = result.into_result().unwrap_err();
        match &error {
            CertAgentError::StagingTransfer {
                file,
                remote_path,
                attempts,
                ..
            } => {
                assert_eq!(file, "9a5ba575.0");
                assert_eq!(remote_path, "/data/local/tmp/9a5ba575.0");
                assert_eq!(*attempts, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(error.to_string().contains("No space left"));
    }

    #[test]
    fn test_method_serializes_snake_case() {
        let json = serde_json::to_string(&InstallMethod::TempCopyCat).unwrap();
        assert_eq!(json, "\"temp_copy_cat\"");
    }
}
