//! Logging configuration using tracing.

use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified level.
///
/// Lines go to stdout with timestamp and severity, suitable for capture by
/// cron or a systemd journal. `RUST_LOG` takes precedence when set.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .init();

    Ok(())
}
