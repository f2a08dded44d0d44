//! Backup rotator - Main entry point
//!
//! One-shot run, intended to be invoked periodically by cron or a systemd
//! timer. All configuration comes from the environment; see `config.rs`.

use anyhow::Result;
use clap::Parser;
use qbt_backup::orchestrator::{self, RunOutcome};
use qbt_backup::{utils, Config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    utils::logger::init(log_level)?;

    tracing::info!("Starting qbt-backup v{}", env!("CARGO_PKG_VERSION"));

    if let RunOutcome::Aborted(reason) = orchestrator::run(&config) {
        // Historically an aborted run still exits 0 so scheduler logs stay
        // clean; QBT_STRICT_EXIT=true surfaces it via the exit status.
        if config.strict_exit {
            anyhow::bail!("run aborted: {reason}");
        }
    }

    Ok(())
}
