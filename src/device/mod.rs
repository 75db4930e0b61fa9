// file: src/device/mod.rs
// version: 1.0.0
// guid: ff33fca0-06aa-47ec-807a-18a7ff7ba811

//! Device transports and shell command construction

pub mod adb;
pub mod command;
pub mod discovery;
pub mod executor;
pub mod local;

pub use adb::AdbShell;
pub use command::{quote, Elevation, ShellCommand};
pub use discovery::{parse_devices, resolve_adb, AdbHost, DeviceInfo};
pub use executor::{CommandOutput, RemoteShell};
pub use local::LocalShell;
