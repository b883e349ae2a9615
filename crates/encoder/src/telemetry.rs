//! Process-wide logging setup.

use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::EncoderError;

const DEFAULT_FILTER: &str = "info,encoder=debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit one JSON object per line instead of human-readable output.
    pub json_format: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Installs the global tracing subscriber and routes `log` records into it.
///
/// Fails if a global subscriber or logger is already installed. The `log`
/// bridge goes in first, so a process that already has a logger is left
/// without a half-installed subscriber.
pub fn init_logging(config: LoggingConfig) -> Result<(), EncoderError> {
    LogTracer::init().map_err(|e| EncoderError::Logging(e.to_string()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let result = if config.json_format {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(true)),
        )
    };
    result.map_err(|e| EncoderError::Logging(e.to_string()))?;

    tracing::info!(json_format = config.json_format, "Logging initialized");
    Ok(())
}
