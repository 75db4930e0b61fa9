// file: src/cert/openssl.rs
// version: 1.0.0
// guid: 3e83676f-4871-419b-8366-c752cb5f11fd

//! DER to `<hash>.0` conversion through the `openssl` binary

use crate::device::executor::capture;
use crate::{CertAgentError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Longest hash accepted from `-subject_hash_old`
const MAX_HASH_LEN: usize = 28;

/// Outcome of [`OpenSsl::convert`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedCertificate {
    pub source: PathBuf,
    pub hash: String,
    /// The renamed PEM file, `<hash>.0`
    pub output: PathBuf,
}

/// Wrapper around the `openssl` command line tool
#[derive(Debug, Clone)]
pub struct OpenSsl {
    binary: PathBuf,
    timeout: Duration,
}

impl OpenSsl {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Find `configured` either as a path or on `PATH`
    pub fn locate(configured: &str, timeout: Duration) -> Result<Self> {
        let candidate = Path::new(configured);
        let binary = if candidate.components().count() > 1 {
            if !candidate.exists() {
                return Err(CertAgentError::certificate(format!(
                    "openssl not found at {}",
                    candidate.display()
                )));
            }
            candidate.to_path_buf()
        } else {
            which::which(configured).map_err(|_| {
                CertAgentError::certificate("openssl is not installed or not in PATH")
            })?
        };

        Ok(Self::new(binary, timeout))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Convert a DER certificate to PEM, replacing any existing `pem`
    pub async fn der_to_pem(&self, der: &Path, pem: &Path) -> Result<()> {
        if !der.is_file() {
            return Err(CertAgentError::local_io(format!(
                "{} does not exist",
                der.display()
            )));
        }

        if pem.exists() {
            tokio::fs::remove_file(pem).await.map_err(|e| {
                CertAgentError::local_io(format!("Cannot replace {}: {}", pem.display(), e))
            })?;
        }

        let mut command = Command::new(&self.binary);
        command
            .args(["x509", "-inform", "DER", "-in"])
            .arg(der)
            .arg("-out")
            .arg(pem);

        let output = capture(command, self.timeout).await?;
        if !output.success() {
            return Err(CertAgentError::certificate(format!(
                "Failed to convert {} to {}: {}",
                der.display(),
                pem.display(),
                output.stderr.trim()
            )));
        }

        info!("{} converted to {}", der.display(), pem.display());
        Ok(())
    }

    /// The legacy (pre-1.0) subject hash of a PEM certificate
    pub async fn subject_hash_old(&self, pem: &Path) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command
            .args(["x509", "-inform", "PEM", "-subject_hash_old", "-noout", "-in"])
            .arg(pem);

        let output = capture(command, self.timeout).await?;
        if !output.success() {
            return Err(CertAgentError::certificate(format!(
                "Failed to read subject hash of {}: {}",
                pem.display(),
                output.stderr.trim()
            )));
        }

        let hash = parse_subject_hash(&output.stdout)?;
        debug!("Subject hash of {}: {}", pem.display(), hash);
        Ok(hash)
    }

    /// Full pipeline: DER to PEM in `out_dir`, then rename to `<hash>.0`
    pub async fn convert(&self, der: &Path, out_dir: &Path) -> Result<ConvertedCertificate> {
        let stem = der
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CertAgentError::invalid_argument(format!("Bad file name: {}", der.display()))
            })?;
        let pem = out_dir.join(format!("{}.pem", stem));

        self.der_to_pem(der, &pem).await?;
        let hash = self.subject_hash_old(&pem).await?;
        let output = rename_to_hash(&pem, &hash).await?;

        Ok(ConvertedCertificate {
            source: der.to_path_buf(),
            hash,
            output,
        })
    }
}

/// Take the hash from the first line of `-subject_hash_old` output
pub fn parse_subject_hash(stdout: &str) -> Result<String> {
    let first = stdout.lines().next().unwrap_or_default().trim();

    if first.is_empty() {
        return Err(CertAgentError::certificate("openssl printed no subject hash"));
    }

    let valid = first.len() <= MAX_HASH_LEN
        && first.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !valid {
        return Err(CertAgentError::certificate(format!(
            "Unexpected subject hash: {}",
            first
        )));
    }

    Ok(first.to_string())
}

/// Move `pem` to `<hash>.0` next to it, keeping its bytes unchanged
async fn rename_to_hash(pem: &Path, hash: &str) -> Result<PathBuf> {
    let target = pem
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}.0", hash));

    if tokio::fs::rename(pem, &target).await.is_err() {
        // rename fails across filesystems
        tokio::fs::copy(pem, &target).await.map_err(|e| {
            CertAgentError::local_io(format!(
                "Failed to move {} to {}: {}",
                pem.display(),
                target.display(),
                e
            ))
        })?;
        tokio::fs::remove_file(pem).await?;
    }

    info!("{} moved to {}", pem.display(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Self-signed DER certificate, or `None` when openssl is unavailable
    fn make_der(dir: &Path) -> Option<PathBuf> {
        which::which("openssl").ok()?;

        let key = dir.join("key.pem");
        let pem = dir.join("source.pem");
        let der = dir.join("proxy.der");

        let status = std::process::Command::new("openssl")
            .args(["req", "-x509", "-newkey", "rsa:2048", "-nodes", "-days", "1"])
            .args(["-subj", "/CN=cert-installer-test"])
            .arg("-keyout")
            .arg(&key)
            .arg("-out")
            .arg(&pem)
            .output()
            .ok()?;
        if !status.status.success() {
            return None;
        }

        let status = std::process::Command::new("openssl")
            .args(["x509", "-outform", "DER", "-in"])
            .arg(&pem)
            .arg("-out")
            .arg(&der)
            .output()
            .ok()?;
        status.status.success().then_some(der)
    }

    #[test]
    fn test_parse_subject_hash() {
        assert_eq!(parse_subject_hash("9a5ba575\n").unwrap(), "9a5ba575");
        assert_eq!(parse_subject_hash("  c8750f0d  \nextra").unwrap(), "c8750f0d");
        assert!(parse_subject_hash("").is_err());
        assert!(parse_subject_hash("9A5BA575\n").is_err());
        assert!(parse_subject_hash("not-a-hash\n").is_err());
        assert!(parse_subject_hash(&"a".repeat(29)).is_err());
    }

    #[tokio::test]
    async fn test_rename_preserves_bytes() {
        let dir = TempDir::new().unwrap();
        let pem = dir.path().join("burp.pem");
        let contents = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
        std::fs::write(&pem, contents).unwrap();

        let target = rename_to_hash(&pem, "9a5ba575").await.unwrap();

        assert_eq!(target, dir.path().join("9a5ba575.0"));
        assert!(!pem.exists());
        assert_eq!(std::fs::read(&target).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_missing_der_is_local_error() {
        let dir = TempDir::new().unwrap();
        let openssl = OpenSsl::new("openssl", Duration::from_secs(10));

        let result = openssl
            .der_to_pem(&dir.path().join("absent.der"), &dir.path().join("out.pem"))
            .await;

        assert!(matches!(result, Err(CertAgentError::LocalIo(_))));
    }

    #[tokio::test]
    async fn test_convert_with_openssl() {
        let dir = TempDir::new().unwrap();
        let Some(der) = make_der(dir.path()) else {
            eprintln!("openssl not available, skipping");
            return;
        };

        let openssl = OpenSsl::locate("openssl", Duration::from_secs(30)).unwrap();
        let converted = openssl.convert(&der, dir.path()).await.unwrap();

        assert_eq!(converted.hash.len(), 8);
        assert!(converted
            .hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(
            converted.output,
            dir.path().join(format!("{}.0", converted.hash))
        );
        assert!(!dir.path().join("proxy.pem").exists());

        let text = std::fs::read_to_string(&converted.output).unwrap();
        assert!(text.starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[tokio::test]
    async fn test_convert_rejects_garbage() {
        if which::which("openssl").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let der = dir.path().join("broken.der");
        std::fs::write(&der, b"not a certificate").unwrap();

        let openssl = OpenSsl::locate("openssl", Duration::from_secs(30)).unwrap();
        let result = openssl.convert(&der, dir.path()).await;

        assert!(matches!(result, Err(CertAgentError::Certificate(_))));
    }
}
