//! Log subscriber setup for the binary

use crate::config::LogConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured filter. Logs go to stderr so command
/// output on stdout stays clean.
///
/// # Errors
/// When the filter directive is invalid or a subscriber is already set.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
    } else {
        builder
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
    }
}
