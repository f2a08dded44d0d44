//! Builds one staged tar.gz archive per instance per run.
//!
//! The archive is written to a staging file inside the instance's backup
//! directory, named with the process id so two overlapping invocations never
//! collide, and without the `.tar.gz` suffix so tier queries and the pruner
//! never mistake it for a promoted archive. The staging file is removed on
//! every exit path; only abrupt process termination can leave one behind.

use crate::archive::filter::{self, EntryKind};
use crate::instance::Instance;
use crate::Result;
use chrono::{Local, NaiveDateTime, TimeZone};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// The single transient archive of a run, deleted when dropped.
#[derive(Debug)]
pub struct StagedArchive {
    path: PathBuf,
}

impl StagedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedArchive {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staging file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Produces filtered, gzip-compressed tar archives of instance source trees.
pub struct ArchiveBuilder {
    compression: Compression,
}

impl ArchiveBuilder {
    /// Compression level is clamped to gzip's 1-9 range.
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level.clamp(1, 9)),
        }
    }

    /// Archives `instance`'s source tree into a staging file under
    /// `staging_dir`, stamping the file's modification time with `timestamp`
    /// so promoted copies carry the archive's creation time.
    pub fn build(
        &self,
        instance: &Instance,
        staging_dir: &Path,
        timestamp: NaiveDateTime,
    ) -> Result<StagedArchive> {
        if !instance.path.is_dir() {
            return Err(crate::RotatorError::SourceMissing(instance.path.clone()));
        }

        std::fs::create_dir_all(staging_dir)?;
        let staging_path =
            staging_dir.join(format!(".staging_{}_{}.tmp", std::process::id(), instance.name));

        match self.write_archive(instance, &staging_path, timestamp) {
            Ok(()) => Ok(StagedArchive { path: staging_path }),
            Err(e) => {
                let _ = std::fs::remove_file(&staging_path);
                Err(e)
            }
        }
    }

    fn write_archive(
        &self,
        instance: &Instance,
        staging_path: &Path,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        let file = File::create(staging_path)?;
        let encoder = GzEncoder::new(file, self.compression);
        let mut tar = tar::Builder::new(encoder);
        tar.follow_symlinks(false);

        let walker = WalkDir::new(&instance.path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(&instance.path).unwrap_or(entry.path());
                rel.as_os_str().is_empty()
                    || !filter::should_exclude(rel, EntryKind::from(entry.file_type()))
            });

        for entry in walker {
            let entry = entry?;
            let rel = entry.path().strip_prefix(&instance.path).unwrap_or(entry.path());
            let name = Path::new(&instance.name).join(rel);

            if entry.file_type().is_dir() {
                tar.append_dir(&name, entry.path())?;
            } else {
                tar.append_path_with_name(entry.path(), &name)?;
            }
        }

        let encoder = tar.into_inner()?;
        let file = encoder.finish()?;

        if let Some(mtime) = local_timestamp(timestamp) {
            file.set_modified(mtime)?;
        }

        Ok(())
    }
}

/// Interprets a wall-clock timestamp in the local timezone. `None` only for
/// times skipped by a DST transition.
fn local_timestamp(ts: NaiveDateTime) -> Option<SystemTime> {
    Local.from_local_datetime(&ts).earliest().map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flate2::read::GzDecoder;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn run_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 10, 0)
            .unwrap()
    }

    fn test_instance(root: &Path) -> Instance {
        Instance {
            name: "alpha".to_string(),
            path: root.to_path_buf(),
        }
    }

    /// Maps archive member path -> is_symlink.
    fn archive_entries(archive_path: &Path) -> HashMap<String, bool> {
        let file = File::open(archive_path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let is_symlink = entry.header().entry_type().is_symlink();
                (path, is_symlink)
            })
            .collect()
    }

    #[test]
    fn builds_filtered_archive() {
        let source = TempDir::new().unwrap();
        fs::create_dir(source.path().join("torrents")).unwrap();
        fs::write(source.path().join("torrents/a.torrent"), b"data").unwrap();
        fs::write(source.path().join("qBittorrent.lock"), b"pid").unwrap();
        fs::create_dir(source.path().join("cache")).unwrap();
        fs::write(source.path().join("cache/x.tmp"), b"junk").unwrap();
        fs::create_dir(source.path().join("logs")).unwrap();
        fs::write(source.path().join("logs/app.log"), b"log").unwrap();

        let staging = TempDir::new().unwrap();
        let instance = test_instance(source.path());
        let staged = ArchiveBuilder::new(6)
            .build(&instance, staging.path(), run_timestamp())
            .unwrap();

        let entries = archive_entries(staged.path());
        assert!(entries.contains_key("alpha/torrents/a.torrent"));
        assert!(!entries.contains_key("alpha/qBittorrent.lock"));
        assert!(!entries.keys().any(|p| p.contains("cache")));
        assert!(!entries.keys().any(|p| p.contains("logs")));
    }

    #[test]
    fn symlinks_are_stored_as_links() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("real.txt"), b"content").unwrap();
        std::os::unix::fs::symlink("real.txt", source.path().join("link")).unwrap();

        let staging = TempDir::new().unwrap();
        let instance = test_instance(source.path());
        let staged = ArchiveBuilder::new(1)
            .build(&instance, staging.path(), run_timestamp())
            .unwrap();

        let entries = archive_entries(staged.path());
        assert_eq!(entries.get("alpha/real.txt"), Some(&false));
        assert_eq!(entries.get("alpha/link"), Some(&true));
    }

    #[test]
    fn staging_file_is_pid_scoped_and_not_an_archive_name() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("f"), b"x").unwrap();

        let staging = TempDir::new().unwrap();
        let instance = test_instance(source.path());
        let staged = ArchiveBuilder::new(6)
            .build(&instance, staging.path(), run_timestamp())
            .unwrap();

        let name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.contains(&std::process::id().to_string()));
        assert!(name.contains("alpha"));
        assert!(!name.ends_with(".tar.gz"));
    }

    #[test]
    fn staged_archive_is_removed_on_drop() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("f"), b"x").unwrap();

        let staging = TempDir::new().unwrap();
        let instance = test_instance(source.path());
        let staged = ArchiveBuilder::new(6)
            .build(&instance, staging.path(), run_timestamp())
            .unwrap();

        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let staging = TempDir::new().unwrap();
        let instance = Instance {
            name: "gone".to_string(),
            path: PathBuf::from("/nonexistent_path_12345"),
        };

        let result = ArchiveBuilder::new(6).build(&instance, staging.path(), run_timestamp());
        assert!(result.is_err());
    }

    #[test]
    fn staging_mtime_matches_the_run_timestamp() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("f"), b"x").unwrap();

        let staging = TempDir::new().unwrap();
        let instance = test_instance(source.path());
        let ts = run_timestamp();
        let staged = ArchiveBuilder::new(6).build(&instance, staging.path(), ts).unwrap();

        let modified = fs::metadata(staged.path()).unwrap().modified().unwrap();
        assert_eq!(Some(modified), local_timestamp(ts));
    }
}
