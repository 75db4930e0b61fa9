// file: src/device/command.rs
// version: 1.0.1
// guid: fc1abbb4-75b8-46e8-8c56-5bd9d75e82b9

//! Structured shell command construction
//!
//! Commands sent to a device are built from a program name and an argument
//! list instead of hand-assembled strings. Quoting and superuser wrapping are
//! applied here and nowhere else, so call sites never nest quotes themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a command is lifted to superuser privilege on the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Elevation {
    /// `su -c '<command>'` (Magisk, SuperSU and most userdebug builds)
    #[default]
    Su,
    /// `su 0 sh -c '<command>'` (AOSP `su` from the emulator images)
    SuRoot,
    /// The transport already runs privileged; commands are sent as-is
    None,
}

impl Elevation {
    /// Wrap an already rendered command line
    pub fn wrap(&self, command_line: &str) -> String {
        match self {
            Elevation::Su => format!("su -c {}", quote(command_line)),
            Elevation::SuRoot => format!("su 0 sh -c {}", quote(command_line)),
            Elevation::None => command_line.to_string(),
        }
    }
}

/// A single command to run through a remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    stdout_to: Option<String>,
    elevate: bool,
}

impl ShellCommand {
    /// Create a command for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_to: None,
            elevate: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Redirect standard output into `path` on the target
    pub fn redirect_stdout(mut self, path: impl Into<String>) -> Self {
        self.stdout_to = Some(path.into());
        self
    }

    /// Run the command with superuser privilege
    pub fn elevated(self) -> Self {
        self.with_elevation(true)
    }

    pub fn with_elevation(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    /// Render the command line without any privilege wrapping
    pub fn render_plain(&self) -> String {
        let mut line = quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        if let Some(path) = &self.stdout_to {
            line.push_str(" > ");
            line.push_str(&quote(path));
        }
        line
    }

    /// Render the full command line, applying `elevation` when the command is elevated
    pub fn render(&self, elevation: Elevation) -> String {
        let plain = self.render_plain();
        if self.elevate {
            elevation.wrap(&plain)
        } else {
            plain
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elevate {
            write!(f, "[su] {}", self.render_plain())
        } else {
            f.write_str(&self.render_plain())
        }
    }
}

/// Quote a word for a POSIX shell
///
/// Words made only of characters the shell never interprets are returned
/// unchanged. Anything else is single-quoted, with embedded single quotes
/// written as `'\''`.
pub fn quote(word: &str) -> String {
    let is_plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));

    if is_plain {
        return word.to_string();
    }

    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for c in word.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_words_untouched() {
        assert_eq!(quote("/system/etc/security/cacerts/9a5ba575.0"), "/system/etc/security/cacerts/9a5ba575.0");
        assert_eq!(quote("rw,remount"), "rw,remount");
        assert_eq!(quote("if=/data/local/tmp/a.0"), "if=/data/local/tmp/a.0");
    }

    #[test]
    fn test_quote_special_characters() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("my cert.0"), "'my cert.0'");
        assert_eq!(quote("a;rm -rf /"), "'a;rm -rf /'");
        assert_eq!(quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_render_plain_command() {
        let cmd = ShellCommand::new("mount").args(["-o", "rw,remount", "/system"]);
        assert_eq!(cmd.render(Elevation::Su), "mount -o rw,remount /system");
        assert_eq!(cmd.render(Elevation::SuRoot), cmd.render_plain());
    }

    #[test]
    fn test_render_elevated_redirect() {
        let cmd = ShellCommand::new("cat")
            .arg("/data/local/tmp/9a5ba575.0")
            .redirect_stdout("/system/etc/security/cacerts/9a5ba575.0")
            .elevated();

        assert_eq!(
            cmd.render(Elevation::Su),
            "su -c 'cat /data/local/tmp/9a5ba575.0 > /system/etc/security/cacerts/9a5ba575.0'"
        );
        assert_eq!(
            cmd.render(Elevation::SuRoot),
            "su 0 sh -c 'cat /data/local/tmp/9a5ba575.0 > /system/etc/security/cacerts/9a5ba575.0'"
        );
        assert_eq!(
            cmd.render(Elevation::None),
            "cat /data/local/tmp/9a5ba575.0 > /system/etc/security/cacerts/9a5ba575.0"
        );
    }

    #[test]
    fn test_elevation_nests_quotes_once() {
        let cmd = ShellCommand::new("ls").arg("/sdcard/My Certs").elevated();
        assert_eq!(cmd.render(Elevation::Su), "su -c 'ls '\\''/sdcard/My Certs'\\'''");
    }

    #[test]
    fn test_display_marks_elevated() {
        let cmd = ShellCommand::new("chmod").args(["644", "/system/x.0"]).elevated();
        assert_eq!(cmd.to_string(), "[su] chmod 644 /system/x.0");
    }
}
