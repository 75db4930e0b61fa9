// file: src/installer/installer.rs
// version: 1.0.1
// guid: 7e11f7f8-e96e-4e48-a7ad-258017ee0cf4

//! Fallback chain that installs one file on a possibly read-only filesystem

use super::script::FallbackScript;
use super::types::{AttemptRecord, InstallMethod, InstallRequest, InstallResult, InstallStep};
use crate::config::AgentConfig;
use crate::device::{CommandOutput, Elevation, RemoteShell, ShellCommand};
use crate::{CertAgentError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Knobs for [`RemoteFileInstaller`]
#[derive(Debug, Clone)]
pub struct InstallerSettings {
    /// World-writable directory on the device used for staging
    pub staging_dir: String,
    /// Mount points tried with `mount -o rw,remount`
    pub remount_targets: Vec<String>,
    /// Run the advisory root probe first
    pub probe_root: bool,
    /// Where the fallback script is written locally; system temp dir when `None`
    pub script_dir: Option<PathBuf>,
    /// Limit for listings and other probes
    pub probe_timeout: Duration,
    /// Limit for copy, mount and chmod commands
    pub command_timeout: Duration,
    /// Limit for native pushes
    pub transfer_timeout: Duration,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            staging_dir: "/data/local/tmp".to_string(),
            remount_targets: vec!["/system".to_string(), "/".to_string()],
            probe_root: true,
            script_dir: None,
            probe_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(30),
        }
    }
}

impl InstallerSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            staging_dir: config.install.staging_dir.clone(),
            remount_targets: config.install.remount_targets.clone(),
            probe_root: config.install.probe_root,
            script_dir: config.install.script_dir.clone(),
            probe_timeout: Duration::from_secs(config.timeouts.probe_seconds),
            command_timeout: Duration::from_secs(config.timeouts.command_seconds),
            transfer_timeout: Duration::from_secs(config.timeouts.transfer_seconds),
        }
    }
}

/// Installs a local file at a remote path through a [`RemoteShell`]
///
/// The sequence is: advisory root probe, remount, parent directory check,
/// direct push, staged copy fallbacks, permission fix-up and verification.
/// Remote failures never surface as errors; they are recorded in
/// [`InstallResult::diagnostic`] and the next strategy is tried.
pub struct RemoteFileInstaller {
    settings: InstallerSettings,
}

impl RemoteFileInstaller {
    pub fn new(settings: InstallerSettings) -> Self {
        Self { settings }
    }

    /// Run the whole sequence for `request`
    ///
    /// Returns `Err` for local failures (unreadable file, fallback script
    /// I/O) and when the shell transport cannot be used at all. A failed
    /// staging push ends the install early with [`InstallResult::aborted`] set.
    pub async fn install<S>(&self, shell: &mut S, request: &InstallRequest) -> Result<InstallResult>
    where
        S: RemoteShell + ?Sized,
    {
        check_local_file(request.local_path()).await?;

        let span = tracing::info_span!(
            "install",
            device = shell.name(),
            destination = request.destination()
        );
        let started = Instant::now();

        let mut result = async {
            let mut chain = Chain::new(shell, &self.settings, request);
            chain.run().await?;
            Ok::<_, CertAgentError>(chain.result)
        }
        .instrument(span)
        .await?;

        result.duration = started.elapsed();
        Ok(result)
    }
}

async fn check_local_file(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        CertAgentError::local_io(format!("Cannot read {}: {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(CertAgentError::local_io(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    tokio::fs::File::open(path).await.map_err(|e| {
        CertAgentError::local_io(format!("Cannot read {}: {}", path.display(), e))
    })?;

    Ok(())
}

/// Outcome of the staged transfer
enum Staged {
    Copied(InstallMethod),
    AllFailed,
    StagingFailed,
}

/// State of one install run; every remote call goes through [`Chain::exec`] or [`Chain::push`]
struct Chain<'a, S: RemoteShell + ?Sized> {
    shell: &'a mut S,
    settings: &'a InstallerSettings,
    request: &'a InstallRequest,
    result: InstallResult,
}

impl<'a, S: RemoteShell + ?Sized> Chain<'a, S> {
    fn new(shell: &'a mut S, settings: &'a InstallerSettings, request: &'a InstallRequest) -> Self {
        Self {
            shell,
            settings,
            request,
            result: InstallResult::new(request.destination()),
        }
    }

    async fn run(&mut self) -> Result<()> {
        if self.settings.probe_root {
            info!("[1/7] Checking root access...");
            self.probe_root().await?;
        }

        info!("[2/7] Preparing system partition...");
        self.remount().await?;

        info!("[3/7] Checking {}...", self.request.parent_dir());
        self.ensure_directory().await?;

        info!("[4/7] Pushing {} to {}...", self.request.file_name(), self.request.destination());
        let method = if self.direct_push().await? {
            info!("✓ Pushed directly to {}", self.request.destination());
            Some(InstallMethod::DirectPush)
        } else {
            warn!("Direct push failed, trying staged copy...");
            match self.staged_transfer().await? {
                Staged::Copied(method) => Some(method),
                Staged::AllFailed => None,
                Staged::StagingFailed => {
                    self.result.aborted = Some(format!(
                        "could not stage {} under {}",
                        self.request.file_name(),
                        self.settings.staging_dir
                    ));
                    return Ok(());
                }
            }
        };

        let Some(method) = method else {
            warn!("✗ All copy methods failed");
            return Ok(());
        };

        self.result.succeeded = true;
        self.result.method_used = Some(method);

        info!("[6/7] Setting permissions...");
        self.fix_permissions().await?;

        info!("[7/7] Verifying installation...");
        self.verify().await?;

        Ok(())
    }

    /// Run one command and record it
    async fn exec(
        &mut self,
        step: InstallStep,
        command: ShellCommand,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let line = command.render(self.shell.elevation());
        let output = self.shell.run(&command, timeout).await?;
        self.record(AttemptRecord::from_output(step, line, &output));
        Ok(output)
    }

    /// Push one file and record it
    async fn push(
        &mut self,
        step: InstallStep,
        local: &Path,
        remote_path: &str,
    ) -> Result<CommandOutput> {
        let output = self
            .shell
            .push(local, remote_path, self.settings.transfer_timeout)
            .await?;
        let description = format!("push {} {}", local.display(), remote_path);
        self.record(AttemptRecord::from_output(step, description, &output));
        Ok(output)
    }

    fn record(&mut self, record: AttemptRecord) {
        if record.succeeded() {
            debug!("{}: ok ({})", record.step, record.command);
        } else if record.timed_out {
            debug!("{}: timed out ({})", record.step, record.command);
        } else {
            debug!(
                "{}: exit {:?} ({}) {}",
                record.step, record.exit_code, record.command, record.stderr_snippet
            );
        }
        self.result.diagnostic.push(record);
    }

    async fn probe_root(&mut self) -> Result<()> {
        let command = ShellCommand::new("id").arg("-u").elevated();
        let output = self
            .exec(InstallStep::RootProbe, command, self.settings.probe_timeout)
            .await?;

        let is_root = output.success() && output.stdout.trim() == "0";
        self.result.root_available = Some(is_root);

        if is_root {
            info!("✓ Root access available");
        } else {
            warn!("Device does not appear to grant root; continuing anyway");
        }
        Ok(())
    }

    async fn remount(&mut self) -> Result<()> {
        let output = self.shell.remount(self.settings.command_timeout).await?;
        self.record(AttemptRecord::from_output(InstallStep::Remount, "remount", &output));
        if output.success() {
            info!("✓ Remounted using transport remount");
            self.result.remounted = true;
            return Ok(());
        }

        let targets = self.settings.remount_targets.clone();
        let passes: &[bool] = if self.shell.elevation() == Elevation::None {
            &[false]
        } else {
            &[false, true]
        };
        for &elevate in passes {
            for target in &targets {
                let command = ShellCommand::new("mount")
                    .args(["-o", "rw,remount"])
                    .arg(target.as_str())
                    .with_elevation(elevate);
                let output = self
                    .exec(InstallStep::Remount, command, self.settings.command_timeout)
                    .await?;
                if output.success() {
                    info!("✓ Remounted {} read-write", target);
                    self.result.remounted = true;
                    return Ok(());
                }
            }
        }

        warn!("Failed to remount read-write; trying to continue without remount");
        Ok(())
    }

    async fn ensure_directory(&mut self) -> Result<()> {
        let parent = self.request.parent_dir().to_string();

        let listing = ShellCommand::new("ls").arg(parent.as_str());
        let output = self
            .exec(InstallStep::ProbeDirectory, listing, self.settings.probe_timeout)
            .await?;
        if output.success() {
            return Ok(());
        }

        info!("Creating {}...", parent);
        let mkdir = ShellCommand::new("mkdir").args(["-p", parent.as_str()]);
        let output = self
            .exec(
                InstallStep::CreateDirectory,
                mkdir.clone().elevated(),
                self.settings.command_timeout,
            )
            .await?;
        if output.success() {
            return Ok(());
        }

        let output = self
            .exec(InstallStep::CreateDirectory, mkdir, self.settings.command_timeout)
            .await?;
        if !output.success() {
            warn!("Could not create {}", parent);
        }
        Ok(())
    }

    async fn direct_push(&mut self) -> Result<bool> {
        let request = self.request;
        let output = self
            .push(InstallStep::DirectPush, request.local_path(), request.destination())
            .await?;
        Ok(output.success())
    }

    async fn staged_transfer(&mut self) -> Result<Staged> {
        let request = self.request;
        let staged = format!(
            "{}/{}",
            self.settings.staging_dir.trim_end_matches('/'),
            request.file_name()
        );

        let output = self
            .push(InstallStep::Stage, request.local_path(), &staged)
            .await?;
        if !output.success() {
            warn!("✗ Failed to push file: {}", output.stderr.trim());
            return Ok(Staged::StagingFailed);
        }
        self.result.staging_path = Some(staged.clone());
        info!("✓ File pushed to {}", staged);

        info!("[5/7] Copying to system location...");
        let copied = self.copy_from_staging(&staged).await;

        let cleanup = ShellCommand::new("rm").args(["-f", staged.as_str()]);
        self.exec(InstallStep::Cleanup, cleanup, self.settings.command_timeout)
            .await?;

        match copied? {
            Some(method) => {
                info!("✓ Copied using {}", method);
                Ok(Staged::Copied(method))
            }
            None => Ok(Staged::AllFailed),
        }
    }

    /// Try each staged copy strategy in order, stopping at the first success
    async fn copy_from_staging(&mut self, staged: &str) -> Result<Option<InstallMethod>> {
        let destination = self.request.destination().to_string();

        for method in InstallMethod::STAGED_ORDER {
            let step = InstallStep::Copy(method);
            let timeout = self.settings.command_timeout;

            let succeeded = match method {
                InstallMethod::TempCopyDd => {
                    let dd = ShellCommand::new("dd")
                        .arg(format!("if={}", staged))
                        .arg(format!("of={}", destination))
                        .elevated();
                    self.exec(step, dd, timeout).await?.success()
                }
                InstallMethod::TempCopyCat => {
                    let cat = ShellCommand::new("cat")
                        .arg(staged)
                        .redirect_stdout(destination.as_str())
                        .elevated();
                    self.exec(step, cat, timeout).await?.success()
                }
                InstallMethod::TempCopyCp => {
                    let cp = ShellCommand::new("cp").args([staged, destination.as_str()]);
                    self.exec(step, cp, timeout).await?.success()
                }
                InstallMethod::ScriptFallback => {
                    self.script_fallback(staged, &destination).await?
                }
                InstallMethod::DirectPush => false,
            };

            if succeeded {
                return Ok(Some(method));
            }
            warn!("{} failed", method);
        }

        Ok(None)
    }

    /// Push a script doing the privileged copy, run it, then remove both copies
    async fn script_fallback(&mut self, staged: &str, destination: &str) -> Result<bool> {
        let script = FallbackScript::write(
            self.settings.script_dir.as_deref(),
            staged,
            destination,
            self.shell.elevation(),
        )?;
        let remote_script = format!(
            "{}/{}",
            self.settings.staging_dir.trim_end_matches('/'),
            script.file_name()
        );

        let outcome = self.run_script(script.path(), &remote_script).await;
        let succeeded = match &outcome {
            Ok(record) => {
                self.record(record.clone());
                record.succeeded()
            }
            Err(_) => false,
        };

        let rm = ShellCommand::new("rm").args(["-f", remote_script.as_str()]);
        let cleanup = self
            .exec(InstallStep::Cleanup, rm, self.settings.command_timeout)
            .await;
        let removed = script.remove();

        outcome?;
        cleanup?;
        removed?;
        Ok(succeeded)
    }

    /// The attempt record for the script strategy, taken from the step that decided it
    async fn run_script(&mut self, local: &Path, remote_script: &str) -> Result<AttemptRecord> {
        let step = InstallStep::Copy(InstallMethod::ScriptFallback);
        let timeout = self.settings.command_timeout;

        let pushed = self
            .shell
            .push(local, remote_script, self.settings.transfer_timeout)
            .await?;
        if !pushed.success() {
            let description = format!("push {} {}", local.display(), remote_script);
            return Ok(AttemptRecord::from_output(step, description, &pushed));
        }

        let chmod = ShellCommand::new("chmod").args(["755", remote_script]);
        let chmodded = self.shell.run(&chmod, timeout).await?;
        if !chmodded.success() {
            debug!("chmod on {} failed: {}", remote_script, chmodded.stderr.trim());
        }

        let invoke = ShellCommand::new(remote_script);
        let line = invoke.render(self.shell.elevation());
        let output = self.shell.run(&invoke, timeout).await?;
        Ok(AttemptRecord::from_output(step, line, &output))
    }

    async fn fix_permissions(&mut self) -> Result<()> {
        let chmod = ShellCommand::new("chmod").args([self.request.mode(), self.request.destination()]);
        let timeout = self.settings.command_timeout;

        let output = self
            .exec(InstallStep::Chmod, chmod.clone().elevated(), timeout)
            .await?;
        if output.success() {
            info!("✓ Permissions set to {}", self.request.mode());
            self.result.permissions_set = true;
            return Ok(());
        }

        let output = self.exec(InstallStep::Chmod, chmod, timeout).await?;
        self.result.permissions_set = output.success();
        if output.success() {
            info!("✓ Permissions set (without su)");
        } else {
            warn!("Could not set permissions on {}", self.request.destination());
        }
        Ok(())
    }

    async fn verify(&mut self) -> Result<()> {
        let listing = ShellCommand::new("ls").args(["-la", self.request.destination()]);
        let output = self
            .exec(InstallStep::Verify, listing, self.settings.probe_timeout)
            .await?;

        self.result.verified = output.success() && output.stdout.contains(self.request.file_name());
        if output.success() {
            self.result.listing = Some(output.stdout.trim().to_string());
        }

        if self.result.verified {
            info!("✓ Installed at {}", self.request.destination());
        } else {
            warn!("⚠ Installation completed but verification failed");
        }
        Ok(())
    }
}
