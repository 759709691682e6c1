//! Crash-safe file replacement

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;

/// Sibling path the new contents are staged in
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes`
///
/// The data is written and synced to a staging file which is then renamed
/// over the target, so readers see either the old or the new contents.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staging = staging_path(path);
    let result = (|| {
        let mut file = File::create(&staging)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&staging, path)
    })();

    if let Err(err) = result {
        log::warn!("atomic write of {} failed: {}", path.display(), err);
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    Ok(())
}

/// Read a file, mapping "not found" to `None`
pub(crate) fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_sits_next_to_target() {
        let staged = staging_path(Path::new("/var/lib/probe/ammonia.json"));
        assert_eq!(staged, Path::new("/var/lib/probe/ammonia.json.tmp"));
    }

    #[test]
    fn write_replaces_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("record.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_optional(&dir.path().join("absent.json")).unwrap(), None);
    }
}
