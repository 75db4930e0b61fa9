// file: src/error.rs
// version: 1.0.1
// guid: eee1e0b5-92c6-497c-a8b8-46099bc8f387

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, CertAgentError>;

/// Error types for the certificate installer
///
/// Only conditions that stop an operation outright live here. A remote command
/// that exits non-zero or times out is not an error: the installer records it
/// as a failed attempt and moves to the next strategy.
#[derive(Error, Debug)]
pub enum CertAgentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local file error: {0}")]
    LocalIo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Shell transport error: {0}")]
    Shell(String),

    #[error("Failed to stage {file} at {remote_path} after {attempts} remote calls: {stderr}")]
    StagingTransfer {
        file: String,
        remote_path: String,
        stderr: String,
        /// Length of the diagnostic trail when the install stopped
        attempts: usize,
    },

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CertAgentError {
    /// Create a new local file error
    pub fn local_io(msg: impl Into<String>) -> Self {
        Self::LocalIo(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new certificate error
    pub fn certificate(msg: impl Into<String>) -> Self {
        Self::Certificate(msg.into())
    }

    /// Create a new shell transport error
    pub fn shell(msg: impl Into<String>) -> Self {
        Self::Shell(msg.into())
    }

    /// Create a new device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
