//! Collection-scoped advisory locking.
//!
//! Every collection directory carries a `LOCK` file. Readers take a shared
//! OS-level advisory lock on it, writers an exclusive one, so the
//! single-writer/multiple-reader discipline holds across independent
//! processes:
//!
//! ```text
//! <root>/<collection>/
//! ├─ LOCK              # Advisory lock file (never a document)
//! ├─ 0f3a9c1e7b22d405  # Documents, one file per identifier
//! └─ .tmp-…            # In-flight atomic writes
//! ```
//!
//! Inside one process the OS lock is paired with a per-collection
//! `RwLock` taken first in the same mode. Some platforms (and network
//! filesystems emulating `flock` with `fcntl`) scope advisory locks to the
//! process rather than the file handle; the in-process lock keeps threads
//! of the same process ordered there. The file lock stays the source of
//! truth between processes.
//!
//! Locks are not re-entrant. A thread holding a lock on a collection must
//! not request another lock on the same collection.

use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, Mutex, RawRwLock, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Name of the lock file inside every collection directory.
///
/// Not a valid document identifier, so it never shows up in listings.
pub const LOCK_FILE: &str = "LOCK";

/// Upper bound for the poll interval of [`CollectionLock::acquire_timeout`].
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Process-wide registry of in-process collection locks, keyed by directory.
///
/// Entries are never removed; the map holds one small entry per collection
/// directory this process has ever locked.
static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>> = OnceLock::new();

fn process_lock(dir: &Path) -> Arc<RwLock<()>> {
    let mut locks = REGISTRY.get_or_init(Default::default).lock();
    Arc::clone(locks.entry(dir.to_path_buf()).or_default())
}

/// Lock mode for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Any number of shared holders; used by readers.
    Shared,
    /// A single holder excluding all others; used by writers.
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("shared"),
            Self::Exclusive => f.write_str("exclusive"),
        }
    }
}

enum ProcessGuard {
    Shared(#[allow(dead_code)] ArcRwLockReadGuard<RawRwLock, ()>),
    Exclusive(#[allow(dead_code)] ArcRwLockWriteGuard<RawRwLock, ()>),
}

/// A held lock on one collection.
///
/// The lock is released by [`CollectionLock::release`] or, on every other
/// exit path, when the guard is dropped.
///
/// # Example
///
/// ```no_run
/// use dirdb_storage::{CollectionLock, LockMode};
/// use std::path::Path;
///
/// let lock = CollectionLock::acquire(Path::new("db/users"), LockMode::Shared)?;
/// // ... read documents ...
/// lock.release()?;
/// # Ok::<(), dirdb_storage::StorageError>(())
/// ```
pub struct CollectionLock {
    dir: PathBuf,
    mode: LockMode,
    file: File,
    held: bool,
    // Dropped after `file`, so the OS lock goes first.
    _process: ProcessGuard,
}

impl CollectionLock {
    /// Acquires a lock on the collection stored in `dir`, blocking until it
    /// is available.
    ///
    /// There is no timeout. See [`CollectionLock::acquire_timeout`] for a
    /// bounded wait.
    ///
    /// # Errors
    ///
    /// - [`StorageError::LockUnavailable`] if the collection directory does
    ///   not exist
    /// - [`StorageError::Io`] for any other filesystem fault
    pub fn acquire(dir: &Path, mode: LockMode) -> StorageResult<Self> {
        let file = open_lock_file(dir)?;
        let lock = process_lock(dir);

        let process = match mode {
            LockMode::Shared => ProcessGuard::Shared(lock.read_arc()),
            LockMode::Exclusive => ProcessGuard::Exclusive(lock.write_arc()),
        };
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file)?,
            LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
        }

        trace!(dir = %dir.display(), %mode, "collection lock acquired");
        Ok(Self::held(dir, mode, file, process))
    }

    /// Shorthand for `acquire(dir, LockMode::Shared)`.
    pub fn shared(dir: &Path) -> StorageResult<Self> {
        Self::acquire(dir, LockMode::Shared)
    }

    /// Shorthand for `acquire(dir, LockMode::Exclusive)`.
    pub fn exclusive(dir: &Path) -> StorageResult<Self> {
        Self::acquire(dir, LockMode::Exclusive)
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `Ok(None)` if another holder (thread or process) has a
    /// conflicting lock.
    pub fn try_acquire(dir: &Path, mode: LockMode) -> StorageResult<Option<Self>> {
        let file = open_lock_file(dir)?;
        let lock = process_lock(dir);

        let process = match mode {
            LockMode::Shared => lock.try_read_arc().map(ProcessGuard::Shared),
            LockMode::Exclusive => lock.try_write_arc().map(ProcessGuard::Exclusive),
        };
        let Some(process) = process else {
            return Ok(None);
        };

        let attempt = match mode {
            LockMode::Shared => FileExt::try_lock_shared(&file),
            LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
        };
        match attempt {
            Ok(()) => {
                trace!(dir = %dir.display(), %mode, "collection lock acquired");
                Ok(Some(Self::held(dir, mode, file, process)))
            }
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Acquires the lock, giving up once `timeout` has elapsed.
    ///
    /// Polls [`CollectionLock::try_acquire`] with a growing interval.
    /// Returns `Ok(None)` if the deadline passed without the lock becoming
    /// available. A timeout too large to represent as a deadline (such as
    /// `Duration::MAX`) waits indefinitely.
    pub fn acquire_timeout(
        dir: &Path,
        mode: LockMode,
        timeout: Duration,
    ) -> StorageResult<Option<Self>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Self::acquire(dir, mode).map(Some);
        };
        let mut interval = Duration::from_millis(1);

        loop {
            if let Some(lock) = Self::try_acquire(dir, mode)? {
                return Ok(Some(lock));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(interval.min(deadline - now));
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }
    }

    fn held(dir: &Path, mode: LockMode, file: File, process: ProcessGuard) -> Self {
        Self {
            dir: dir.to_path_buf(),
            mode,
            file,
            held: true,
            _process: process,
        }
    }

    /// Returns the collection directory this lock covers.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the lock mode.
    #[must_use]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Returns true if this is an exclusive lock.
    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        self.mode == LockMode::Exclusive
    }

    /// Releases the lock, reporting any failure to unlock.
    pub fn release(mut self) -> StorageResult<()> {
        self.unlock()?;
        Ok(())
    }

    fn unlock(&mut self) -> io::Result<()> {
        if self.held {
            self.held = false;
            FileExt::unlock(&self.file)?;
            trace!(dir = %self.dir.display(), mode = %self.mode, "collection lock released");
        }
        Ok(())
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            // Closing the handle below still drops the OS lock.
            warn!(dir = %self.dir.display(), error = %e, "failed to unlock collection");
        }
    }
}

impl fmt::Debug for CollectionLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionLock")
            .field("dir", &self.dir)
            .field("mode", &self.mode)
            .field("held", &self.held)
            .finish()
    }
}

/// Opens (creating if missing) the lock file of a collection.
///
/// Creation is idempotent, so concurrent first openers all succeed.
fn open_lock_file(dir: &Path) -> StorageResult<File> {
    let path = dir.join(LOCK_FILE);
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StorageError::LockUnavailable { path, source },
            _ => StorageError::Io(source),
        })
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == fs2::lock_contended_error().kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempdir().unwrap();

        let lock = CollectionLock::exclusive(dir.path()).unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());
        assert!(lock.is_exclusive());
        assert_eq!(lock.dir(), dir.path());
    }

    #[test]
    fn missing_directory_is_lock_unavailable() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let result = CollectionLock::shared(&missing);
        assert!(matches!(result, Err(StorageError::LockUnavailable { .. })));
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = tempdir().unwrap();

        let first = CollectionLock::shared(dir.path()).unwrap();
        let second = CollectionLock::try_acquire(dir.path(), LockMode::Shared).unwrap();
        assert!(second.is_some());

        drop(second);
        first.release().unwrap();
    }

    #[test]
    fn exclusive_excludes_everyone() {
        let dir = tempdir().unwrap();

        let lock = CollectionLock::exclusive(dir.path()).unwrap();
        assert!(CollectionLock::try_acquire(dir.path(), LockMode::Shared)
            .unwrap()
            .is_none());
        assert!(CollectionLock::try_acquire(dir.path(), LockMode::Exclusive)
            .unwrap()
            .is_none());

        lock.release().unwrap();
        assert!(CollectionLock::try_acquire(dir.path(), LockMode::Exclusive)
            .unwrap()
            .is_some());
    }

    #[test]
    fn shared_excludes_exclusive() {
        let dir = tempdir().unwrap();

        let _reader = CollectionLock::shared(dir.path()).unwrap();
        assert!(CollectionLock::try_acquire(dir.path(), LockMode::Exclusive)
            .unwrap()
            .is_none());
    }

    #[test]
    fn drop_releases_lock() {
        let dir = tempdir().unwrap();

        {
            let _lock = CollectionLock::exclusive(dir.path()).unwrap();
        }

        assert!(CollectionLock::try_acquire(dir.path(), LockMode::Exclusive)
            .unwrap()
            .is_some());
    }

    #[test]
    fn different_collections_do_not_block() {
        let root = tempdir().unwrap();
        let users = root.path().join("users");
        let posts = root.path().join("posts");
        std::fs::create_dir(&users).unwrap();
        std::fs::create_dir(&posts).unwrap();

        let _users = CollectionLock::exclusive(&users).unwrap();
        assert!(CollectionLock::try_acquire(&posts, LockMode::Exclusive)
            .unwrap()
            .is_some());
    }

    #[test]
    fn acquire_timeout_gives_up() {
        let dir = tempdir().unwrap();
        let _lock = CollectionLock::exclusive(dir.path()).unwrap();

        let start = Instant::now();
        let result =
            CollectionLock::acquire_timeout(dir.path(), LockMode::Shared, Duration::from_millis(30))
                .unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn acquire_timeout_succeeds_when_free() {
        let dir = tempdir().unwrap();

        let lock =
            CollectionLock::acquire_timeout(dir.path(), LockMode::Exclusive, Duration::ZERO)
                .unwrap();
        assert!(lock.is_some());
    }

    #[test]
    fn acquire_timeout_accepts_unbounded_duration() {
        let dir = tempdir().unwrap();

        let lock = CollectionLock::acquire_timeout(dir.path(), LockMode::Shared, Duration::MAX)
            .unwrap()
            .unwrap();
        assert_eq!(lock.mode(), LockMode::Shared);
    }

    #[test]
    fn blocking_acquire_waits_for_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let writer = CollectionLock::exclusive(&path).unwrap();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let lock = CollectionLock::shared(&path).unwrap();
            tx.send(lock.mode()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        writer.release().unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            LockMode::Shared
        );
        handle.join().unwrap();
    }
}
