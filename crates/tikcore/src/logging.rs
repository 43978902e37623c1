//! Logging initialization
//!
//! The code base logs through the `log` facade; records are bridged into a
//! `tracing-subscriber` fmt subscriber so both `log` and `tracing` events end up
//! in the same output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Picks the default filter when RUST_LOG is not set.
fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Initialize the global logger.
///
/// Level comes from `RUST_LOG` when present, otherwise `debug` if `debug` is set
/// and `info` if not.
///
/// # Returns
/// * `Err(anyhow::Error)` - a global logger was already installed
pub fn init_logger(debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;
    tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("Failed to bridge log records: {}", e))?;

    Ok(())
}
