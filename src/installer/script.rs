// file: src/installer/script.rs
// version: 1.0.0
// guid: 6402a4cd-4ff8-4c18-aa18-395cc07ff661

//! Shell script used as the last staged copy strategy

use crate::device::{Elevation, ShellCommand};
use crate::{CertAgentError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Script body that copies `staged` over `destination` with a privileged redirect
pub fn script_body(staged: &str, destination: &str, elevation: Elevation) -> String {
    let copy = ShellCommand::new("cat")
        .arg(staged)
        .redirect_stdout(destination)
        .elevated();

    format!("#!/system/bin/sh\n{}\nexit\n", copy.render(elevation))
}

/// Local copy of the fallback script; removed on [`FallbackScript::remove`] or drop
pub struct FallbackScript {
    file: NamedTempFile,
}

impl FallbackScript {
    /// Write the script into `dir`, or the system temp directory when `None`
    pub fn write(
        dir: Option<&Path>,
        staged: &str,
        destination: &str,
        elevation: Elevation,
    ) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cert-install-").suffix(".sh");

        let created = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|e| {
            CertAgentError::local_io(format!("Failed to create fallback script: {}", e))
        })?;

        file.write_all(script_body(staged, destination, elevation).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| {
                CertAgentError::local_io(format!("Failed to write fallback script: {}", e))
            })?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// File name of the local script, reused for the remote copy
    pub fn file_name(&self) -> String {
        self.file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "cert-install.sh".to_string())
    }

    /// Delete the local script
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().display().to_string();
        self.file.close().map_err(|e| {
            CertAgentError::local_io(format!("Failed to remove fallback script {}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_script_body() {
        let body = script_body(
            "/data/local/tmp/9a5ba575.0",
            "/system/etc/security/cacerts/9a5ba575.0",
            Elevation::Su,
        );
        assert_eq!(
            body,
            "#!/system/bin/sh\n\
             su -c 'cat /data/local/tmp/9a5ba575.0 > /system/etc/security/cacerts/9a5ba575.0'\n\
             exit\n"
        );
    }

    #[test]
    fn test_script_written_and_removed() {
        let dir = TempDir::new().unwrap();
        let script = FallbackScript::write(Some(dir.path()), "/a", "/b", Elevation::None).unwrap();
        let path = script.path().to_path_buf();

        assert!(path.exists());
        assert!(script.file_name().ends_with(".sh"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("cat /a > /b"));

        script.remove().unwrap();
        assert!(!path.exists());
    }
}
