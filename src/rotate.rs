//! Tier directory operations: promotion, pruning, and the last-promotion
//! query.
//!
//! A tier's "last promoted time" is always re-derived from the newest
//! archive on disk rather than persisted separately, so an externally
//! emptied tier directory simply bootstraps again on the next run.

use crate::Result;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Suffix shared by every promoted archive. The staging file deliberately
/// does not carry it, so it is invisible to the queries below.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Name of a promoted archive: `<instance>_<YYYY-MM-DD_HH-MM-SS>.tar.gz`.
pub fn archive_filename(instance: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}{}",
        instance,
        timestamp.format("%Y-%m-%d_%H-%M-%S"),
        ARCHIVE_SUFFIX
    )
}

/// Copies the staged archive into `tier_dir/filename`. A copy, not a move:
/// the staged archive stays available for the remaining tiers of the run.
///
/// The destination keeps the staged archive's modification time, so
/// [`latest_archive_time`] reflects when the archive was built rather than
/// when it was copied.
pub fn promote(tier_dir: &Path, staged: &Path, filename: &str) -> Result<PathBuf> {
    let dest = tier_dir.join(filename);
    fs::copy(staged, &dest)?;

    let modified = fs::metadata(staged)?.modified()?;
    let dest_file = fs::OpenOptions::new().write(true).open(&dest)?;
    dest_file.set_modified(modified)?;

    Ok(dest)
}

/// Deletes the oldest archives beyond `keep`, ordered by modification time.
/// Individual delete failures are logged and skipped. Returns the number of
/// archives actually removed.
pub fn prune(tier_dir: &Path, keep: usize) -> usize {
    let mut files = match archive_files(tier_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list {}: {}", tier_dir.display(), e);
            return 0;
        }
    };

    if files.len() <= keep {
        return 0;
    }

    files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in files.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Pruned old backup: {}", path.display());
                removed += 1;
            }
            Err(e) => error!("Error deleting {}: {}", path.display(), e),
        }
    }

    removed
}

/// Modification time of the newest archive in `tier_dir`, as local wall-clock
/// time. `None` when the directory is missing or holds no archives.
pub fn latest_archive_time(tier_dir: &Path) -> io::Result<Option<NaiveDateTime>> {
    if !tier_dir.is_dir() {
        return Ok(None);
    }

    let newest = archive_files(tier_dir)?
        .into_iter()
        .map(|(_, modified)| modified)
        .max();

    Ok(newest.map(|m| DateTime::<Local>::from(m).naive_local()))
}

/// All `*.tar.gz` regular files in `dir` with their modification times.
fn archive_files(dir: &Path) -> io::Result<Vec<(PathBuf, SystemTime)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().ends_with(ARCHIVE_SUFFIX) {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        files.push((entry.path(), metadata.modified()?));
    }

    Ok(files)
}
