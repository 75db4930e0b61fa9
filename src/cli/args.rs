// file: src/cli/args.rs
// version: 1.0.0
// guid: 25fe04ad-c537-46ac-9429-7761dc6f9771

//! Command line argument definitions

use crate::device::Elevation;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "android-cert-installer")]
#[command(about = "Convert CA certificates and install them into an Android system trust store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Defaults to the interactive menu
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Target device serial
    #[arg(short, long, global = true, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a DER certificate to PEM named after its subject hash
    Convert {
        /// DER file; picked from --dir when omitted
        file: Option<PathBuf>,

        /// Directory searched for .der files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Where the <hash>.0 file is written; defaults to the input's directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Install a <hash>.0 certificate into the device trust store
    Install {
        /// Certificate file; picked from --dir when omitted
        file: Option<PathBuf>,

        /// Directory searched for .0 files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Trust store directory on the target
        #[arg(long)]
        dest_dir: Option<String>,

        /// Octal permission mode for the installed file
        #[arg(short, long)]
        mode: Option<String>,

        /// How superuser commands are invoked
        #[arg(long, value_enum)]
        elevation: Option<Elevation>,

        /// Install through the host shell instead of adb
        #[arg(long)]
        local: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Reboot the device after a successful install
        #[arg(long)]
        reboot: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check adb and list connected devices
    Devices {
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,

    /// Interactive menu
    Menu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["android-cert-installer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::try_parse_from([
            "android-cert-installer",
            "install",
            "9a5ba575.0",
            "--dest-dir",
            "/system/etc/security/cacerts",
            "--mode",
            "644",
            "--elevation",
            "su-root",
            "--yes",
            "--json",
            "-s",
            "emulator-5554",
        ])
        .unwrap();

        assert_eq!(cli.serial.as_deref(), Some("emulator-5554"));
        match cli.command {
            Some(Commands::Install {
                file,
                dest_dir,
                mode,
                elevation,
                yes,
                json,
                local,
                ..
            }) => {
                assert_eq!(file, Some(PathBuf::from("9a5ba575.0")));
                assert_eq!(dest_dir.as_deref(), Some("/system/etc/security/cacerts"));
                assert_eq!(mode.as_deref(), Some("644"));
                assert_eq!(elevation, Some(Elevation::SuRoot));
                assert!(yes && json && !local);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_convert_defaults() {
        let cli = Cli::try_parse_from(["android-cert-installer", "convert"]).unwrap();
        match cli.command {
            Some(Commands::Convert { file, dir, out_dir }) => {
                assert!(file.is_none());
                assert_eq!(dir, PathBuf::from("."));
                assert!(out_dir.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
