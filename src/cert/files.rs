// file: src/cert/files.rs
// version: 1.0.0
// guid: c0b417be-2cc0-433e-bf5b-111725c3aa7b

//! Locating certificate files in a directory

use crate::{CertAgentError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which files a listing should pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    /// DER exports waiting for conversion (`*.der`)
    Der,
    /// Hash-named files ready for the device store (`*.0`)
    Hashed,
}

impl CertificateKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Der => "der",
            Self::Hashed => "0",
        }
    }
}

/// List the certificate files of `kind` directly inside `dir`, sorted by name
pub fn find_certificates(dir: &Path, kind: CertificateKind) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CertAgentError::local_io(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            CertAgentError::local_io(format!("Cannot list {}: {}", dir.display(), e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()));
        if matches {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// True for names of the form `<lowercase hex>.<digit>`, as used by the device store
pub fn is_hash_file_name(name: &str) -> bool {
    let Some((hash, suffix)) = name.rsplit_once('.') else {
        return false;
    };

    !hash.is_empty()
        && hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        && !suffix.is_empty()
        && suffix.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_der_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("proxy.der"), b"x").unwrap();
        fs::write(dir.path().join("ca.DER"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("9a5ba575.0"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested.der")).unwrap();

        let found = find_certificates(dir.path(), CertificateKind::Der).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["ca.DER", "proxy.der"]);
    }

    #[test]
    fn test_find_hashed_files_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("9a5ba575.0"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deadbeef.0"), b"x").unwrap();

        let found = find_certificates(dir.path(), CertificateKind::Hashed).unwrap();
        assert_eq!(found, vec![dir.path().join("9a5ba575.0")]);
    }

    #[test]
    fn test_find_in_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = find_certificates(&dir.path().join("absent"), CertificateKind::Der);
        assert!(matches!(result, Err(CertAgentError::LocalIo(_))));
    }

    #[test]
    fn test_hash_file_names() {
        assert!(is_hash_file_name("9a5ba575.0"));
        assert!(is_hash_file_name("c8750f0d.1"));
        assert!(!is_hash_file_name("9A5BA575.0"));
        assert!(!is_hash_file_name("burp.pem"));
        assert!(!is_hash_file_name(".0"));
        assert!(!is_hash_file_name("9a5ba575"));
    }
}
