#![forbid(unsafe_code)]

//! Logging setup.
//!
//! Library crates only emit `tracing` events. Binaries call [`init`] once to
//! install a formatted subscriber filtered by the `KEEPSAKE_LOG` environment
//! variable (same syntax as `RUST_LOG`).

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "KEEPSAKE_LOG";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event (requires `logging-json`).
    Json,
}

/// Install the global subscriber.
///
/// `default_directive` applies when `KEEPSAKE_LOG` is unset or invalid.
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "logging")]
pub fn init(default_directive: &str, format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        #[cfg(feature = "logging-json")]
        LogFormat::Json => builder.json().try_init().is_ok(),
        #[cfg(not(feature = "logging-json"))]
        LogFormat::Json => {
            tracing::warn!("JSON logging requested without the logging-json feature");
            builder.try_init().is_ok()
        }
        LogFormat::Pretty => builder.try_init().is_ok(),
    }
}
