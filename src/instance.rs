//! Backup instances, re-derived from the source root on every run.

use std::io;
use std::path::{Path, PathBuf};

/// Names that never count as instances. `lost+found` is the ext filesystem
/// recovery directory and shows up at the root of any ext2/3/4 volume.
const RESERVED_NAMES: &[&str] = &["lost+found"];

/// One backup target: an immediate subdirectory of the source root.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Directory basename, used for archive and staging file names.
    pub name: String,

    /// Absolute path of the instance's source tree.
    pub path: PathBuf,
}

/// Enumerates the immediate subdirectories of `source_root` as instances,
/// in sorted order so runs are deterministic.
pub fn discover(source_root: &Path) -> io::Result<Vec<Instance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(source_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if RESERVED_NAMES.contains(&name.as_str()) {
            continue;
        }

        instances.push(Instance {
            name,
            path: entry.path(),
        });
    }

    instances.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovers_subdirectories_only() -> io::Result<()> {
        let root = TempDir::new()?;
        fs::create_dir(root.path().join("beta"))?;
        fs::create_dir(root.path().join("alpha"))?;
        fs::write(root.path().join("stray-file"), b"not an instance")?;

        let instances = discover(root.path())?;
        let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);

        Ok(())
    }

    #[test]
    fn skips_reserved_names() -> io::Result<()> {
        let root = TempDir::new()?;
        fs::create_dir(root.path().join("alpha"))?;
        fs::create_dir(root.path().join("lost+found"))?;

        let instances = discover(root.path())?;
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "alpha");

        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(discover(Path::new("/nonexistent_path_12345")).is_err());
    }
}
