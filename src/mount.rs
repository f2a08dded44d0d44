//! Mount-safety preflight for the backup destination.
//!
//! A run must never write archives onto the root filesystem because the
//! expected storage volume failed to mount. The check gates the entire run.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Returns true only if `path` exists and is the root of a mounted
/// filesystem, not merely a directory under one.
///
/// A path is a mount root when its device id differs from its parent's, or
/// when path and parent resolve to the same inode (the filesystem root
/// itself). Symlinks are never mount roots.
pub fn is_mount_point(path: &Path) -> bool {
    let Ok(symlink_meta) = std::fs::symlink_metadata(path) else {
        return false;
    };
    if symlink_meta.file_type().is_symlink() {
        return false;
    }

    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(parent_meta) = std::fs::metadata(path.join("..")) else {
        return false;
    };

    meta.dev() != parent_meta.dev() || meta.ino() == parent_meta.ino()
}
