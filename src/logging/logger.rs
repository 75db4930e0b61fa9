// file: src/logging/logger.rs
// version: 1.0.1
// guid: dedbed77-3bbc-4e8c-9da2-baf010d38ab4

//! Logger initialization

use crate::{CertAgentError, Result};
use tracing::Instrument;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn level_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Initialize human-readable logging on stderr
///
/// `quiet` wins over `verbose`. Logs go to stderr so `--json` output on
/// stdout stays parseable.
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(level_filter(verbose, quiet))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| CertAgentError::config(format!("Failed to initialize logger: {}", e)))?;

    Ok(())
}

/// Initialize structured JSON logging on stderr
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
pub fn init_json_logger(verbose: bool, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(verbose, quiet));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| CertAgentError::config(format!("Failed to initialize JSON logger: {}", e)))?;

    Ok(())
}

/// Run a future inside an `operation` span
pub async fn with_async_operation_span<F, Fut, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    let span = tracing::info_span!("operation", name = operation);
    async move { f().await }.instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice() {
        // Only one global subscriber per process; the second call must fail cleanly
        let first = init_logger(false, false);
        let second = init_logger(true, false);

        assert!(first.is_err() || second.is_err());
        if let Err(e) = second {
            assert!(e.to_string().contains("Failed to initialize logger"));
        }
    }

    #[test]
    fn test_init_json_logger_twice() {
        // Act
        let _ = init_json_logger(false, true);
        let second = init_json_logger(true, false);

        // Assert
        // A subscriber is installed by now, whichever test ran first
        let error = second.unwrap_err();
        assert!(error.to_string().contains("Failed to initialize JSON logger"));
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let filter = level_filter(true, true);
        assert!(filter.to_string().contains("error"));
    }

    #[tokio::test]
    async fn test_with_async_operation_span() {
        // Arrange
        let operation = "install";

        // Act
        let result = with_async_operation_span(operation, || async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            "installed"
        })
        .await;

        // Assert
        assert_eq!(result, "installed");
    }
}
