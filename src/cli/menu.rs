// file: src/cli/menu.rs
// version: 1.0.1
// guid: f25eae6a-b810-40a3-82e6-ecd373d50b8a

//! Interactive menu
//!
//! Each action reports its own errors and hands control back to the menu;
//! only end of input or choosing Exit leaves the loop.

use crate::{
    cert::{find_certificates, CertificateKind},
    cli::commands::{
        connect_device, convert_file, installer_settings, print_devices, reboot_device, run_install,
    },
    config::AgentConfig,
    device::{resolve_adb, AdbHost},
    installer::InstallRequest,
    reporter::InstallReporter,
    CertAgentError, Result,
};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const BANNER: &str = r"
>>===========================================<<
||                                           ||
||        A N D R O I D   C E R T S          ||
||     convert  -  install  -  verify        ||
||                                           ||
>>===========================================<<";

/// Print `question` and read one trimmed line; `None` at end of input
///
/// The read yields to the runtime, so a pending Ctrl-C is seen while waiting.
pub async fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `yes` or `y`, in any case
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "yes" | "y")
}

/// Ask a yes/no question on the terminal
pub async fn confirm_stdin(question: &str) -> Result<bool> {
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();
    let answer = ask(&mut input, &mut output, &question.yellow().to_string()).await?;
    Ok(answer.as_deref().is_some_and(is_yes))
}

/// Menu state: configuration, working directory and terminal streams
pub struct Menu<'a, R, W> {
    config: &'a AgentConfig,
    dir: PathBuf,
    input: R,
    output: W,
}

impl<'a, R: AsyncBufRead + Unpin, W: Write> Menu<'a, R, W> {
    pub fn new(config: &'a AgentConfig, dir: impl Into<PathBuf>, input: R, output: W) -> Self {
        Self {
            config,
            dir: dir.into(),
            input,
            output,
        }
    }

    /// Run until the user exits or input ends
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "{}", BANNER.green())?;

        loop {
            self.print_options()?;
            let Some(choice) = ask(&mut self.input, &mut self.output, "Select option (0-3): ").await? else {
                return Ok(());
            };

            let outcome = match choice.as_str() {
                "1" => self.convert().await,
                "2" => self.devices().await,
                "3" => self.install().await,
                "0" => {
                    writeln!(self.output, "{}", "Goodbye!".yellow())?;
                    return Ok(());
                }
                _ => {
                    writeln!(
                        self.output,
                        "{}",
                        "Invalid option! Please select 0, 1, 2 or 3.".red()
                    )?;
                    continue;
                }
            };

            if let Err(e) = outcome {
                writeln!(self.output, "{} {}", "✗".red(), e.to_string().red())?;
            }
        }
    }

    fn print_options(&mut self) -> Result<()> {
        let rule = "=".repeat(50);
        writeln!(self.output, "\n{}", rule.yellow())?;
        writeln!(self.output, "{}", "1. Convert DER certificate to <hash>.0".cyan())?;
        writeln!(self.output, "{}", "2. Check connected devices".cyan())?;
        writeln!(self.output, "{}", "3. Install certificate".cyan())?;
        writeln!(self.output, "{}", "0. Exit".red())?;
        writeln!(self.output, "{}", "-".repeat(50).yellow())?;
        Ok(())
    }

    /// Show numbered files of `kind` and let the user pick one
    async fn choose(&mut self, kind: CertificateKind) -> Result<Option<PathBuf>> {
        let files = find_certificates(&self.dir, kind)?;
        if files.is_empty() {
            return Err(CertAgentError::local_io(format!(
                "No .{} files found in {}",
                kind.extension(),
                self.dir.display()
            )));
        }

        writeln!(self.output, "{}", format!("Available .{} files:", kind.extension()).green())?;
        for (i, file) in files.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, display_name(file))?;
        }

        let question = format!("Enter the number (1-{}) of the file: ", files.len());
        let Some(answer) = ask(&mut self.input, &mut self.output, &question).await? else {
            return Ok(None);
        };

        match answer.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => Ok(Some(files[n - 1].clone())),
            _ => Err(CertAgentError::invalid_argument(format!(
                "Invalid selection. Please enter a number between 1 and {}",
                files.len()
            ))),
        }
    }

    async fn convert(&mut self) -> Result<()> {
        let Some(der) = self.choose(CertificateKind::Der).await? else {
            return Ok(());
        };

        let dir = self.dir.clone();
        let converted = convert_file(self.config, &der, &dir).await?;
        writeln!(
            self.output,
            "{} {} -> {}",
            "✓".green(),
            display_name(&converted.source),
            display_name(&converted.output)
        )?;
        Ok(())
    }

    async fn devices(&mut self) -> Result<()> {
        let adb = resolve_adb(&self.config.adb_path())?;
        let host = AdbHost::new(adb, Duration::from_secs(self.config.timeouts.command_seconds));
        writeln!(self.output, "{}", host.version().await?)?;
        print_devices(&host.devices().await?);
        Ok(())
    }

    async fn install(&mut self) -> Result<()> {
        let mut shell = connect_device(self.config, self.config.adb.elevation).await?;

        let Some(file) = self.choose(CertificateKind::Hashed).await? else {
            return Ok(());
        };
        let request = InstallRequest::into_directory(
            &file,
            &self.config.install.cacerts_dir,
            &self.config.install.mode,
        )?;

        writeln!(self.output, "{}", format!("You selected: {}", display_name(&file)).yellow())?;
        let answer = ask(&mut self.input, &mut self.output, "Proceed with installation? (yes/no): ").await?;
        if !answer.as_deref().is_some_and(is_yes) {
            writeln!(self.output, "{}", "Installation cancelled.".yellow())?;
            return Ok(());
        }

        let settings = installer_settings(self.config, false);
        let result = run_install(settings, &mut shell, &request).await?;
        writeln!(self.output, "{}", InstallReporter::default().render(&result))?;
        let result = result.into_result()?;
        if !result.succeeded {
            return Ok(());
        }

        let answer = ask(&mut self.input, &mut self.output, "Reboot device now? (yes/no): ").await?;
        if answer.as_deref().is_some_and(is_yes) {
            reboot_device(self.config, &mut shell).await?;
        } else {
            writeln!(
                self.output,
                "{}",
                "Please reboot your device manually for changes to take effect.".yellow()
            )?;
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_menu(dir: &Path, script: &str) -> String {
        colored::control::set_override(false);
        let config = AgentConfig::default();
        let mut output = Vec::new();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime
            .block_on(Menu::new(&config, dir, Cursor::new(script.to_string()), &mut output).run())
            .unwrap();

        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_ask_and_eof() {
        let mut input = Cursor::new("  yes \n");
        let mut output = Vec::new();

        assert_eq!(ask(&mut input, &mut output, "? ").await.unwrap().as_deref(), Some("yes"));
        assert_eq!(ask(&mut input, &mut output, "? ").await.unwrap(), None);
        assert_eq!(String::from_utf8(output).unwrap(), "? ? ");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("Y"));
        assert!(is_yes("yes"));
        assert!(!is_yes("no"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_exit_option() {
        let dir = TempDir::new().unwrap();
        let output = run_menu(dir.path(), "0\n");
        assert!(output.contains("1. Convert DER certificate"));
        assert!(output.contains("Goodbye!"));
    }

    #[test]
    fn test_invalid_option_then_end_of_input() {
        let dir = TempDir::new().unwrap();
        let output = run_menu(dir.path(), "7\n");
        assert!(output.contains("Invalid option!"));
    }

    #[test]
    fn test_convert_without_files_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let output = run_menu(dir.path(), "1\n0\n");
        assert!(output.contains("No .der files found"));
        assert!(output.contains("Goodbye!"));
    }

    #[test]
    fn test_invalid_file_selection() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("proxy.der"), b"x").unwrap();

        let output = run_menu(dir.path(), "1\n5\n0\n");
        assert!(output.contains("1. proxy.der"));
        assert!(output.contains("Invalid selection"));
    }
}
