// file: src/reporter/mod.rs
// version: 1.0.0
// guid: bf4de595-0332-412c-ac79-fe96b2d60077

//! Operator-facing rendering of install outcomes

use crate::installer::{AttemptRecord, InstallResult};
use crate::Result;
use colored::Colorize;

/// Renders an [`InstallResult`] for the terminal or as JSON
#[derive(Debug, Clone, Default)]
pub struct InstallReporter {
    /// Include every attempt, not only failures
    pub show_all_attempts: bool,
}

impl InstallReporter {
    pub fn new(show_all_attempts: bool) -> Self {
        Self { show_all_attempts }
    }

    /// Status lines followed by the attempt trail
    pub fn render(&self, result: &InstallResult) -> String {
        let mut lines = Vec::new();

        if let Some(reason) = &result.aborted {
            lines.push(format!("{} Installation aborted: {}", "✗".red(), reason));
        } else if let Some(method) = result.method_used {
            lines.push(format!(
                "{} Installed {} using {}",
                "✓".green(),
                result.destination,
                method
            ));
        } else {
            lines.push(format!("{} All copy methods failed", "✗".red()));
        }

        if result.succeeded {
            if result.permissions_set {
                lines.push(format!("{} Permissions set", "✓".green()));
            } else {
                lines.push(format!("{} Permissions could not be set", "⚠".yellow()));
            }

            if result.verified {
                lines.push(format!("{} Verified at {}", "✓".green(), result.destination));
                if let Some(listing) = &result.listing {
                    lines.push(format!("  {}", listing));
                }
            } else {
                lines.push(format!(
                    "{} Installation completed but verification failed",
                    "⚠".yellow()
                ));
            }
        }

        match result.root_available {
            Some(false) => lines.push(format!(
                "{} Device did not report root access",
                "⚠".yellow()
            )),
            Some(true) | None => {}
        }

        let attempts: Vec<&AttemptRecord> = if self.show_all_attempts {
            result.diagnostic.iter().collect()
        } else {
            result.failures().collect()
        };

        if !attempts.is_empty() {
            let heading = if self.show_all_attempts {
                "Attempts:"
            } else {
                "Failed attempts:"
            };
            lines.push(heading.bold().to_string());
            for record in attempts {
                lines.push(format!("  {}", format_attempt(record)));
            }
        }

        lines.push(format!(
            "Finished in {:.1}s ({} remote calls)",
            result.duration.as_secs_f64(),
            result.diagnostic.len()
        ));

        lines.join("\n")
    }

    /// Pretty JSON for scripting
    pub fn to_json(&self, result: &InstallResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(result)?)
    }
}

/// One attempt as a single line
pub fn format_attempt(record: &AttemptRecord) -> String {
    let status = if record.succeeded() {
        "ok".green()
    } else if record.timed_out {
        "timeout".yellow()
    } else {
        match record.exit_code {
            Some(code) => format!("exit {}", code).red(),
            None => "killed".red(),
        }
    };

    let mut line = format!("[{}] {}: {}", status, record.step, record.command);
    if !record.succeeded() && !record.stderr_snippet.is_empty() {
        line.push_str(&format!(" ({})", record.stderr_snippet));
    }
    line
}
