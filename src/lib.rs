// file: src/lib.rs
// version: 1.0.0
// guid: af241eba-18d7-47b8-ac2a-b0cdc2a0f091

//! # Android certificate installer
//!
//! Converts DER certificates to the `<hash>.0` naming used by the Android
//! system trust store and installs them on a rooted device through `adb`.
//!
//! The core is [`installer::RemoteFileInstaller`], which gets a file onto a
//! possibly read-only filesystem through any [`device::RemoteShell`] by
//! walking an ordered chain of fallback strategies and returning the full
//! attempt trail.

pub mod cert;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod installer;
pub mod logging;
pub mod reporter;

pub use config::AgentConfig;
pub use device::{AdbShell, CommandOutput, Elevation, LocalShell, RemoteShell, ShellCommand};
pub use error::{CertAgentError, Result};
pub use installer::{InstallMethod, InstallRequest, InstallResult, RemoteFileInstaller};

/// Version information for the utility
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
