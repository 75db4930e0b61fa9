// file: src/installer/mod.rs
// version: 1.0.0
// guid: ff480f8c-5049-4d4b-9f16-a9bde40358c4

//! Installing a file on a locked-down device filesystem
//!
//! [`RemoteFileInstaller`] drives the ordered fallback chain. Every remote
//! call it makes ends up as an [`AttemptRecord`] in the returned
//! [`InstallResult`], so callers can show exactly which strategies were tried.

pub mod installer;
pub mod script;
pub mod types;

pub use installer::{InstallerSettings, RemoteFileInstaller};
pub use script::{script_body, FallbackScript};
pub use types::{AttemptRecord, InstallMethod, InstallRequest, InstallResult, InstallStep};
