//! Runs the full backup pipeline across all instances.
//!
//! Execution is sequential and blocking: instances one at a time, tiers
//! within an instance in a fixed order. Failures are isolated per instance
//! and per tier; the staged archive is released before the next instance
//! starts regardless of outcome.

use crate::archive::{ArchiveBuilder, StagedArchive};
use crate::config::Config;
use crate::instance::{self, Instance};
use crate::tier::TierPolicy;
use crate::{mount, rotate, schedule, Result};
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

/// Why a run aborted before touching any destination path.
#[derive(Debug)]
pub enum AbortReason {
    DestinationNotMounted(PathBuf),
    SourceRootMissing(PathBuf),
    SourceRootUnreadable(PathBuf),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::DestinationNotMounted(p) => {
                write!(f, "mount point {} is not mounted", p.display())
            }
            AbortReason::SourceRootMissing(p) => {
                write!(f, "source directory {} does not exist", p.display())
            }
            AbortReason::SourceRootUnreadable(p) => {
                write!(f, "source directory {} is not readable", p.display())
            }
        }
    }
}

/// Aggregated counts for a completed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub instances_processed: usize,
    pub instances_failed: usize,
    pub promotions: usize,
    pub pruned: usize,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    Aborted(AbortReason),
}

/// Runs the pipeline at the current wall-clock time.
pub fn run(config: &Config) -> RunOutcome {
    run_at(config, Local::now().naive_local())
}

/// Runs the pipeline as of `now`. Split out from [`run`] so retention
/// behavior can be exercised against fixed timestamps.
pub fn run_at(config: &Config, now: NaiveDateTime) -> RunOutcome {
    if !mount::is_mount_point(&config.mount_point) {
        error!(
            "Mount point {} is not mounted! Aborting to protect the root filesystem.",
            config.mount_point.display()
        );
        return RunOutcome::Aborted(AbortReason::DestinationNotMounted(config.mount_point.clone()));
    }

    if !config.source_root.is_dir() {
        error!("Source directory {} does not exist.", config.source_root.display());
        return RunOutcome::Aborted(AbortReason::SourceRootMissing(config.source_root.clone()));
    }

    let instances = match instance::discover(&config.source_root) {
        Ok(instances) => instances,
        Err(e) => {
            error!("Failed to enumerate {}: {}", config.source_root.display(), e);
            return RunOutcome::Aborted(AbortReason::SourceRootUnreadable(
                config.source_root.clone(),
            ));
        }
    };

    info!("Starting backup run ({} instances)", instances.len());

    let mut summary = RunSummary::default();
    for inst in &instances {
        info!("Processing instance: {}", inst.name);
        match process_instance(config, inst, now) {
            Ok((promotions, pruned)) => {
                summary.instances_processed += 1;
                summary.promotions += promotions;
                summary.pruned += pruned;
            }
            Err(e) => {
                error!("Backup failed for {}: {}", inst.name, e);
                summary.instances_failed += 1;
            }
        }
    }

    info!(
        "Backup run complete: {} instances, {} failed, {} promotions, {} pruned",
        summary.instances_processed, summary.instances_failed, summary.promotions, summary.pruned
    );

    RunOutcome::Completed(summary)
}

/// Builds the instance's staged archive and offers it to every enabled tier.
/// Returns (promotions, pruned) counts. The staged archive is deleted when
/// this function returns, on success and on error alike.
fn process_instance(config: &Config, inst: &Instance, now: NaiveDateTime) -> Result<(usize, usize)> {
    let dst_base = config.backup_root.join(&inst.name);

    info!("Archiving {} (level {})", inst.name, config.compression_level);
    let staged = ArchiveBuilder::new(config.compression_level).build(inst, &dst_base, now)?;

    let filename = rotate::archive_filename(&inst.name, now);
    let mut promotions = 0;
    let mut pruned = 0;

    for policy in config.tiers.iter().filter(|p| p.enabled) {
        match process_tier(config, policy, inst, &staged, &filename, now) {
            Ok(Some(removed)) => {
                promotions += 1;
                pruned += removed;
            }
            Ok(None) => {}
            Err(e) => {
                // One tier failing must not block the others.
                error!("Promotion to {} failed for {}: {}", policy.tier, inst.name, e);
            }
        }
    }

    Ok((promotions, pruned))
}

/// Promotes into one tier when its calendar boundary was crossed, then
/// prunes that tier. `Ok(None)` means the tier was simply not due.
fn process_tier(
    config: &Config,
    policy: &TierPolicy,
    inst: &Instance,
    staged: &StagedArchive,
    filename: &str,
    now: NaiveDateTime,
) -> Result<Option<usize>> {
    let tier_dir = config.backup_root.join(&inst.name).join(policy.tier.dir_name());
    std::fs::create_dir_all(&tier_dir)?;

    let last = rotate::latest_archive_time(&tier_dir)?;
    if !schedule::should_promote(policy.tier, last, now, config.promotion_hour) {
        return Ok(None);
    }

    let dest = rotate::promote(&tier_dir, staged.path(), filename)?;
    info!("Promoted to {}: {}", policy.tier, dest.display());

    Ok(Some(rotate::prune(&tier_dir, policy.keep)))
}
