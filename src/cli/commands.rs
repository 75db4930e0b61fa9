// file: src/cli/commands.rs
// version: 1.0.1
// guid: f3748c2b-c772-44d5-b3fc-5917ebc9ddf7

//! Command implementations for the CLI

use crate::{
    cert::{find_certificates, is_hash_file_name, CertificateKind, ConvertedCertificate, OpenSsl},
    cli::menu::confirm_stdin,
    config::AgentConfig,
    device::{resolve_adb, AdbHost, AdbShell, DeviceInfo, Elevation, LocalShell, RemoteShell},
    installer::{InstallRequest, InstallResult, InstallerSettings, RemoteFileInstaller},
    logging::with_async_operation_span,
    reporter::InstallReporter,
    CertAgentError, Result,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Options of the `install` subcommand
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub file: Option<PathBuf>,
    pub dir: PathBuf,
    pub dest_dir: Option<String>,
    pub mode: Option<String>,
    pub elevation: Option<Elevation>,
    pub local: bool,
    pub yes: bool,
    pub reboot: bool,
    pub json: bool,
    /// List every attempt in the report, not only failures
    pub verbose: bool,
}

/// Check adb and list connected devices
pub async fn devices_command(config: &AgentConfig, json: bool) -> Result<()> {
    let adb = resolve_adb(&config.adb_path())?;
    let host = AdbHost::new(&adb, Duration::from_secs(config.timeouts.command_seconds));

    let version = host.version().await?;
    let devices = host.devices().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    info!("Using {} ({})", adb.display(), version);
    print_devices(&devices);
    Ok(())
}

pub(crate) fn print_devices(devices: &[DeviceInfo]) {
    if devices.is_empty() {
        warn!("No active devices found. Please connect your device via USB and enable USB debugging.");
        return;
    }

    println!("Connected devices:");
    for device in devices {
        match &device.details {
            Some(details) => println!("  • {} ({}) {}", device.serial, device.state, details),
            None => println!("  • {} ({})", device.serial, device.state),
        }
    }
}

/// Convert a DER certificate to `<hash>.0`
pub async fn convert_command(
    config: &AgentConfig,
    file: Option<PathBuf>,
    dir: &Path,
    out_dir: Option<PathBuf>,
) -> Result<ConvertedCertificate> {
    let der = select_certificate(file, dir, CertificateKind::Der)?;
    let out_dir = match out_dir {
        Some(out_dir) => out_dir,
        None => der
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    convert_file(config, &der, &out_dir).await
}

pub(crate) async fn convert_file(
    config: &AgentConfig,
    der: &Path,
    out_dir: &Path,
) -> Result<ConvertedCertificate> {
    let openssl = OpenSsl::locate(
        &config.openssl_path(),
        Duration::from_secs(config.timeouts.command_seconds),
    )?;

    let converted = with_async_operation_span("convert", || openssl.convert(der, out_dir)).await?;
    info!("✓ Subject hash: {}", converted.hash);
    info!("✓ Certificate ready: {}", converted.output.display());
    Ok(converted)
}

/// Resolve the file to work on: the one given, or the only candidate in `dir`
pub fn select_certificate(file: Option<PathBuf>, dir: &Path, kind: CertificateKind) -> Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file);
    }

    let mut candidates = find_certificates(dir, kind)?;
    match candidates.len() {
        0 => Err(CertAgentError::local_io(format!(
            "No .{} files found in {}",
            kind.extension(),
            dir.display()
        ))),
        1 => Ok(candidates.remove(0)),
        _ => {
            let names: Vec<String> = candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            Err(CertAgentError::invalid_argument(format!(
                "Several .{} files found, pass one of: {}",
                kind.extension(),
                names.join(", ")
            )))
        }
    }
}

/// Open a shell on the configured device, or on the only one attached
pub async fn connect_device(config: &AgentConfig, elevation: Elevation) -> Result<AdbShell> {
    let adb = resolve_adb(&config.adb_path())?;
    let host = AdbHost::new(&adb, Duration::from_secs(config.timeouts.command_seconds));
    let online = host.online_devices().await?;

    let serial = match &config.adb.serial {
        Some(serial) => {
            if !online.iter().any(|d| &d.serial == serial) {
                return Err(CertAgentError::device(format!(
                    "Device {} is not connected",
                    serial
                )));
            }
            serial.clone()
        }
        None => match online.as_slice() {
            [] => {
                return Err(CertAgentError::device(
                    "No active devices found. Please connect your device via USB and enable USB debugging.",
                ))
            }
            [only] => only.serial.clone(),
            _ => {
                return Err(CertAgentError::device(
                    "Several devices connected, pass --serial to pick one",
                ))
            }
        },
    };

    info!("Using device {}", serial);
    Ok(AdbShell::new(adb, Some(serial), elevation))
}

/// Installer settings for `config`; local installs skip the device-only steps
pub fn installer_settings(config: &AgentConfig, local: bool) -> InstallerSettings {
    let mut settings = InstallerSettings::from_config(config);
    if local {
        settings.remount_targets.clear();
        settings.probe_root = false;
    }
    settings
}

/// Run the installer inside an `install` operation span
pub async fn run_install<S>(
    settings: InstallerSettings,
    shell: &mut S,
    request: &InstallRequest,
) -> Result<InstallResult>
where
    S: RemoteShell + ?Sized,
{
    let installer = RemoteFileInstaller::new(settings);
    let installer = &installer;
    with_async_operation_span("install", move || installer.install(shell, request)).await
}

/// Install a certificate file into the trust store
pub async fn install_command(config: &AgentConfig, options: InstallOptions) -> Result<InstallResult> {
    let file = select_certificate(options.file.clone(), &options.dir, CertificateKind::Hashed)?;

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !is_hash_file_name(&name) {
        warn!("{} is not named <hash>.0; Android will not pick it up under this name", name);
    }

    let dest_dir = options
        .dest_dir
        .clone()
        .unwrap_or_else(|| config.install.cacerts_dir.clone());
    let mode = options
        .mode
        .clone()
        .unwrap_or_else(|| config.install.mode.clone());
    let request = InstallRequest::into_directory(&file, &dest_dir, &mode)?;

    if !options.yes {
        let question = format!("Install {} to {}? (yes/no): ", file.display(), request.destination());
        if !confirm_stdin(&question).await? {
            info!("Installation cancelled.");
            return Err(CertAgentError::invalid_argument("Installation cancelled"));
        }
    }

    let settings = installer_settings(config, options.local);
    let reporter = InstallReporter::new(options.verbose);

    let result = if options.local {
        let mut shell = LocalShell::with_elevation(options.elevation.unwrap_or(Elevation::None));
        let result = run_install(settings, &mut shell, &request).await?;
        print_result(&reporter, &result, options.json)?;
        result
    } else {
        let elevation = options.elevation.unwrap_or(config.adb.elevation);
        let mut shell = connect_device(config, elevation).await?;
        let result = run_install(settings, &mut shell, &request).await?;
        print_result(&reporter, &result, options.json)?;

        if options.reboot && result.succeeded {
            reboot_device(config, &mut shell).await?;
        } else if result.succeeded {
            info!("Please reboot your device manually for changes to take effect.");
        }
        result
    };

    let result = result.into_result()?;
    if !result.succeeded {
        return Err(CertAgentError::device(format!(
            "All copy methods failed for {}",
            result.destination
        )));
    }
    Ok(result)
}

fn print_result(reporter: &InstallReporter, result: &InstallResult, json: bool) -> Result<()> {
    if json {
        println!("{}", reporter.to_json(result)?);
    } else {
        println!("{}", reporter.render(result));
    }
    Ok(())
}

pub(crate) async fn reboot_device(config: &AgentConfig, shell: &mut AdbShell) -> Result<()> {
    info!("Rebooting device...");
    let output = shell
        .reboot(Duration::from_secs(config.timeouts.command_seconds))
        .await?;
    if output.success() {
        info!("✓ Device is rebooting");
    } else {
        warn!("Reboot failed: {}", output.stderr.trim());
    }
    Ok(())
}

/// Print the effective configuration
pub async fn config_command(config: &AgentConfig) -> Result<()> {
    if let Some(path) = AgentConfig::user_config_path() {
        info!("User config file: {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
