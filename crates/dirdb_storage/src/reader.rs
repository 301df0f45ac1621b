//! Reading document files under a collection lock.

use crate::error::{StorageError, StorageResult};
use crate::lock::{CollectionLock, LOCK_FILE};
use crate::writer::{sync_committed, TEMP_PREFIX};
use std::fs;
use std::io;
use tracing::{debug, warn};

/// Reads the full content of the document file `name`.
///
/// Either lock mode is sufficient.
///
/// # Errors
///
/// - [`StorageError::NotFound`] if the file does not exist
/// - [`StorageError::Io`] on any other filesystem fault
pub fn read(lock: &CollectionLock, name: &str) -> StorageResult<Vec<u8>> {
    let path = lock.dir().join(name);
    fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound { path },
        _ => StorageError::Io(e),
    })
}

/// Returns true if the document file `name` exists.
pub fn exists(lock: &CollectionLock, name: &str) -> StorageResult<bool> {
    match fs::metadata(lock.dir().join(name)) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Takes a snapshot of the file names in the collection directory.
///
/// The lock file and hidden entries (including in-flight temporary files)
/// are skipped, as are names that are not valid UTF-8. Order is whatever
/// the directory enumeration yields.
pub fn entries(lock: &CollectionLock) -> StorageResult<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(lock.dir())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            warn!(dir = %lock.dir().display(), "skipping non UTF-8 file name");
            continue;
        };
        if name == LOCK_FILE || name.starts_with('.') {
            continue;
        }
        names.push(name);
    }

    Ok(names)
}

/// Removes temporary files left behind by writers that crashed mid-write.
///
/// Requires an exclusive lock so no live writer's temp file is removed.
/// Returns the number of files removed.
pub fn sweep_temp_files(lock: &CollectionLock) -> StorageResult<usize> {
    if !lock.is_exclusive() {
        return Err(StorageError::NotExclusive {
            path: lock.dir().to_path_buf(),
        });
    }

    let mut removed = 0;
    for entry in fs::read_dir(lock.dir())? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    if removed > 0 {
        sync_committed(lock.dir());
        debug!(dir = %lock.dir().display(), removed, "swept temporary files");
    }
    Ok(removed)
}
