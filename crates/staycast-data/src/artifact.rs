//! Atomic artifact persistence.
//!
//! Every artifact the offline pipeline produces is written to a sibling
//! temporary file and renamed into place, so a reader never observes a
//! partially written file.

use crate::error::{DataError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}

/// Write bytes to `path` atomically, creating parent directories.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let written = std::fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    if let Err(e) = written.and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(DataError::Io(e));
    }

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Read and deserialize a JSON artifact.
pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// Delete an artifact that no longer matches its siblings.
///
/// Returns whether a file was removed. A missing file is not an error.
pub fn remove_artifact<P: AsRef<Path>>(path: P) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DataError::Io(e)),
    }
}

/// Reject artifacts written by a different format version.
pub const fn check_version(artifact: &'static str, found: u32, expected: u32) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(DataError::UnsupportedVersion {
            artifact,
            found,
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "staycast-data-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_json_roundtrip_creates_parent() {
        let dir = scratch_dir("json");
        let path = dir.join("nested").join("map.json");

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1_u32);
        write_json(&path, &value).unwrap();

        let loaded: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert_eq!(loaded, value);
        assert!(!temp_path(&path).exists());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = scratch_dir("replace");
        let path = dir.join("artifact.txt");

        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_remove_artifact() {
        let dir = scratch_dir("remove");
        let path = dir.join("model.json");

        write_atomic(&path, b"{}").unwrap();
        assert!(remove_artifact(&path).unwrap());
        assert!(!path.exists());
        assert!(!remove_artifact(&path).unwrap());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_check_version() {
        assert!(check_version("seasons", 1, 1).is_ok());
        assert!(matches!(
            check_version("seasons", 2, 1),
            Err(DataError::UnsupportedVersion { found: 2, .. })
        ));
    }
}
