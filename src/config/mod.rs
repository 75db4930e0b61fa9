// file: src/config/mod.rs
// version: 1.0.0
// guid: 1a70a289-a5f5-4377-af58-b12e3c185adc

//! Configuration for the certificate installer
//!
//! Values come from, in order: built-in defaults, the user config file, a
//! project file in the working directory, an explicit `--config` file and
//! finally environment variables.

pub mod loader;

use crate::device::Elevation;
use crate::{CertAgentError, Result};
use loader::ConfigLoader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = ".android-cert-installer.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    pub adb: AdbConfig,
    pub openssl: OpensslConfig,
    pub install: InstallConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    /// adb binary name or path; `~` is expanded
    pub path: String,
    /// Device serial; required when more than one device is attached
    pub serial: Option<String>,
    pub elevation: Elevation,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            path: "adb".to_string(),
            serial: None,
            elevation: Elevation::Su,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpensslConfig {
    pub path: String,
}

impl Default for OpensslConfig {
    fn default() -> Self {
        Self {
            path: "openssl".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// System trust store on the device
    pub cacerts_dir: String,
    pub staging_dir: String,
    /// Octal permission bits for the installed certificate
    pub mode: String,
    pub remount_targets: Vec<String>,
    pub probe_root: bool,
    pub script_dir: Option<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            cacerts_dir: "/system/etc/security/cacerts".to_string(),
            staging_dir: "/data/local/tmp".to_string(),
            mode: "644".to_string(),
            remount_targets: vec!["/system".to_string(), "/".to_string()],
            probe_root: true,
            script_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub probe_seconds: u64,
    pub command_seconds: u64,
    pub transfer_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_seconds: 5,
            command_seconds: 10,
            transfer_seconds: 30,
        }
    }
}

impl AgentConfig {
    /// Load configuration from every source, `explicit` taking precedence over files found on disk
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let loader = ConfigLoader::new();
        let mut config = Self::default();

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                info!("Loading user configuration from: {}", user_config.display());
                config = loader.load(&user_config)?;
            }
        }

        let project_config = Path::new(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            info!("Loading project configuration from: {}", project_config.display());
            config = loader.load(project_config)?;
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CertAgentError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            config = loader.load(path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        debug!("Final configuration: {:#?}", config);
        Ok(config)
    }

    /// User configuration file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("android-cert-installer").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(adb) = std::env::var("CERT_AGENT_ADB") {
            self.adb.path = adb;
        }

        if let Ok(openssl) = std::env::var("CERT_AGENT_OPENSSL") {
            self.openssl.path = openssl;
        }

        if let Ok(serial) = std::env::var("CERT_AGENT_SERIAL") {
            if !serial.is_empty() {
                self.adb.serial = Some(serial);
            }
        }

        if let Ok(timeout) = std::env::var("CERT_AGENT_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                self.timeouts.command_seconds = seconds;
            }
        }
    }

    /// Reject values the installer cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("install.cacerts_dir", &self.install.cacerts_dir),
            ("install.staging_dir", &self.install.staging_dir),
        ] {
            if !dir.starts_with('/') {
                return Err(CertAgentError::config(format!(
                    "{} must be an absolute device path, got {}",
                    name, dir
                )));
            }
        }

        let mode = &self.install.mode;
        if mode.is_empty() || mode.len() > 4 || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
            return Err(CertAgentError::config(format!(
                "install.mode must be octal, got {}",
                mode
            )));
        }

        let timeouts = &self.timeouts;
        if timeouts.probe_seconds == 0 || timeouts.command_seconds == 0 || timeouts.transfer_seconds == 0 {
            return Err(CertAgentError::config("timeouts must be at least one second"));
        }

        Ok(())
    }

    /// adb path with `~` expanded
    pub fn adb_path(&self) -> String {
        shellexpand::tilde(&self.adb.path).to_string()
    }

    /// openssl path with `~` expanded
    pub fn openssl_path(&self) -> String {
        shellexpand::tilde(&self.openssl.path).to_string()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CertAgentError::config(format!("Failed to render config: {}", e)))
    }
}
