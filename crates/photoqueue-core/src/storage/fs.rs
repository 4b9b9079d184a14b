//! Filesystem helpers shared by exports and photo import

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The target file is never left in a partially-written state.
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_dir(dir: &Path) -> StorageResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Pick `<dir>/<stem>.<ext>`, or `<dir>/<stem>_<n>.<ext>` if that name is taken
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
