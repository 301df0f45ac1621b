//! Atomic document writes.
//!
//! Documents are never truncated in place. The writer:
//! 1. Writes the payload to a fresh `.tmp-<hex>` file in the collection
//!    directory (same filesystem as the target)
//! 2. Syncs the temporary file to disk
//! 3. Renames it over the target name
//! 4. Fsyncs the directory so the rename itself is durable
//!
//! A reader therefore sees either the complete old content or the complete
//! new content, even one that bypasses locking.

use crate::error::{StorageError, StorageResult};
use crate::lock::CollectionLock;
use rand::RngCore;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of in-flight temporary files.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Writes and deletes document files under an exclusive collection lock.
#[derive(Debug, Clone, Copy)]
pub struct AtomicWriter {
    sync: bool,
}

impl Default for AtomicWriter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AtomicWriter {
    /// Creates a writer.
    ///
    /// With `sync` set, the temporary file and the directory are fsynced
    /// around the rename. Without it the rename is still atomic but may not
    /// survive a power loss.
    #[must_use]
    pub const fn new(sync: bool) -> Self {
        Self { sync }
    }

    /// Returns whether writes are synced to disk.
    #[must_use]
    pub const fn syncs(&self) -> bool {
        self.sync
    }

    /// Atomically replaces (or creates) the document file `name`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotExclusive`] if `lock` is a shared lock
    /// - [`StorageError::Io`] on any filesystem fault before the rename;
    ///   the target is left untouched and the temporary file removed
    ///
    /// Once the rename succeeds the write has committed. A failure to fsync
    /// the directory afterwards is logged, not returned.
    pub fn write(&self, lock: &CollectionLock, name: &str, data: &[u8]) -> StorageResult<()> {
        let dir = require_exclusive(lock)?;
        let target = dir.join(name);
        let (temp_path, file) = create_temp_file(dir)?;

        if let Err(e) = self.fill_and_rename(file, data, &temp_path, &target) {
            // Best effort: a leftover temp file is invisible to readers.
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        if self.sync {
            sync_committed(dir);
        }

        debug!(path = %target.display(), bytes = data.len(), "document written");
        Ok(())
    }

    fn fill_and_rename(
        &self,
        mut file: File,
        data: &[u8],
        temp: &Path,
        target: &Path,
    ) -> io::Result<()> {
        file.write_all(data)?;
        if self.sync {
            file.sync_all()?;
        }
        drop(file);
        fs::rename(temp, target)
    }

    /// Deletes the document file `name`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotExclusive`] if `lock` is a shared lock
    /// - [`StorageError::NotFound`] if the file does not exist
    /// - [`StorageError::Io`] on any other filesystem fault
    pub fn delete(&self, lock: &CollectionLock, name: &str) -> StorageResult<()> {
        let dir = require_exclusive(lock)?;
        let path = dir.join(name);

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound { path });
            }
            Err(e) => return Err(e.into()),
        }

        if self.sync {
            sync_committed(dir);
        }

        debug!(path = %path.display(), "document deleted");
        Ok(())
    }
}

fn require_exclusive(lock: &CollectionLock) -> StorageResult<&Path> {
    if lock.is_exclusive() {
        Ok(lock.dir())
    } else {
        Err(StorageError::NotExclusive {
            path: lock.dir().to_path_buf(),
        })
    }
}

/// Creates a uniquely named temporary file in `dir`.
///
/// `create_new` guarantees two writers never share a temp file, even when
/// the lock is bypassed.
fn create_temp_file(dir: &Path) -> io::Result<(PathBuf, File)> {
    let mut rng = rand::thread_rng();
    loop {
        let path = dir.join(format!("{TEMP_PREFIX}{:016x}", rng.next_u64()));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Syncs `dir` after a change that has already taken effect.
pub(crate) fn sync_committed(dir: &Path) {
    if let Err(e) = sync_directory(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to sync directory after commit");
    }
}

/// Syncs a directory so renames and removals inside it are durable.
///
/// Windows NTFS journals metadata updates and does not support opening a
/// directory for fsync, so this is a no-op there.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockMode, LOCK_FILE};
    use crate::reader;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .count()
    }

    #[test]
    fn write_creates_file() {
        let dir = tempdir().unwrap();
        let lock = CollectionLock::exclusive(dir.path()).unwrap();

        AtomicWriter::default()
            .write(&lock, "0123456789abcdef", b"{\"a\":1}")
            .unwrap();

        let data = fs::read(dir.path().join("0123456789abcdef")).unwrap();
        assert_eq!(data, b"{\"a\":1}");
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempdir().unwrap();
        let lock = CollectionLock::exclusive(dir.path()).unwrap();
        let writer = AtomicWriter::new(false);

        writer.write(&lock, "doc", b"a much longer original payload").unwrap();
        writer.write(&lock, "doc", b"short").unwrap();

        assert_eq!(fs::read(dir.path().join("doc")).unwrap(), b"short");
    }

    #[test]
    fn write_requires_exclusive_lock() {
        let dir = tempdir().unwrap();
        let lock = CollectionLock::acquire(dir.path(), LockMode::Shared).unwrap();

        let result = AtomicWriter::default().write(&lock, "doc", b"{}");
        assert!(matches!(result, Err(StorageError::NotExclusive { .. })));
        assert!(!dir.path().join("doc").exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        fs::create_dir(dir.path().join("doc")).unwrap();
        fs::write(dir.path().join("doc").join("inner"), b"x").unwrap();
        let lock = CollectionLock::exclusive(dir.path()).unwrap();

        let result = AtomicWriter::default().write(&lock, "doc", b"{}");
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempdir().unwrap();
        let lock = CollectionLock::exclusive(dir.path()).unwrap();
        let writer = AtomicWriter::default();

        writer.write(&lock, "doc", b"{}").unwrap();
        writer.delete(&lock, "doc").unwrap();

        assert!(!dir.path().join("doc").exists());
        assert!(dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let lock = CollectionLock::exclusive(dir.path()).unwrap();

        let result = AtomicWriter::default().delete(&lock, "missing");
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn delete_requires_exclusive_lock() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc"), b"{}").unwrap();
        let lock = CollectionLock::shared(dir.path()).unwrap();

        let result = AtomicWriter::default().delete(&lock, "doc");
        assert!(matches!(result, Err(StorageError::NotExclusive { .. })));
        assert!(dir.path().join("doc").exists());
    }

    #[cfg(unix)]
    #[test]
    fn directory_sync_failure_after_commit_is_not_an_error() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");

        assert!(sync_directory(&gone).is_err());
        // Logged, not propagated.
        sync_committed(&gone);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn last_write_wins(
            name in "[0-9a-f]{16}",
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..6),
        ) {
            let dir = tempdir().unwrap();
            let lock = CollectionLock::exclusive(dir.path()).unwrap();
            let writer = AtomicWriter::new(false);

            for payload in &payloads {
                writer.write(&lock, &name, payload).unwrap();
                prop_assert_eq!(&reader::read(&lock, &name).unwrap(), payload);
            }

            prop_assert_eq!(reader::entries(&lock).unwrap(), vec![name.clone()]);
            prop_assert_eq!(temp_files(dir.path()), 0);
        }
    }
}
