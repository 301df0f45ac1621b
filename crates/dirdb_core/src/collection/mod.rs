//! Collections of JSON documents.
//!
//! A collection is one directory under the database root. Every operation
//! takes the collection lock for its own duration only:
//!
//! | Operation | Lock      |
//! |-----------|-----------|
//! | `create`  | exclusive |
//! | `read`    | shared    |
//! | `update`  | exclusive |
//! | `delete`  | exclusive |
//! | `list`    | shared    |
//!
//! The directory is created by the first write. Read paths never create
//! anything: reading or listing a collection that was never written yields
//! `DocumentNotFound` or an empty result.

mod typed;

pub use typed::Item;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::id::Id;
use dirdb_storage::{reader, AtomicWriter, CollectionLock, LockMode, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Handle to a named collection.
///
/// Handles are cheap to clone and hold no document state; every call goes
/// to the filesystem. Handles for the same name, in this or any other
/// process, observe each other's writes once the writing call returns.
///
/// Locks are not re-entrant: do not call back into the same collection
/// from inside the closures passed to the typed API.
///
/// # Example
///
/// ```rust,ignore
/// use dirdb_core::Database;
///
/// let db = Database::open("my_db")?;
/// let items = db.collection("items")?;
///
/// let id = items.create(br#"{"a":1}"#)?;
/// items.update(&id, br#"{"a":2}"#)?;
/// assert_eq!(items.read(&id)?, br#"{"a":2}"#);
/// items.delete(&id)?;
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    /// Collection name.
    name: String,
    /// Collection directory (may not exist yet).
    dir: PathBuf,
    /// Writer for document files.
    writer: AtomicWriter,
    /// Identifier generation attempt ceiling.
    id_attempts: u32,
    /// Optional bound on lock waits.
    lock_timeout: Option<Duration>,
}

impl Collection {
    pub(crate) fn new(name: &str, dir: PathBuf, config: &Config) -> Self {
        Self {
            name: name.to_string(),
            dir,
            writer: AtomicWriter::new(config.sync_writes),
            id_attempts: config.id_attempts.max(1),
            lock_timeout: config.lock_timeout,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Stores a new document and returns its generated identifier.
    ///
    /// Creates the collection directory on first use.
    ///
    /// # Errors
    ///
    /// - [`CoreError::GeneratorUnavailable`] if no identifier could be drawn
    /// - [`CoreError::IdentifierCollision`] if every generated identifier
    ///   was already taken
    /// - [`CoreError::Io`] on filesystem faults
    pub fn create(&self, data: &[u8]) -> CoreResult<Id> {
        self.create_with(data, Id::generate)
    }

    pub(crate) fn create_with<G>(&self, data: &[u8], mut generate: G) -> CoreResult<Id>
    where
        G: FnMut() -> CoreResult<Id>,
    {
        fs::create_dir_all(&self.dir)?;
        let lock = self.lock(LockMode::Exclusive)?;

        let id = self.fresh_id(&lock, &mut generate)?;
        self.writer.write(&lock, id.as_str(), data)?;
        lock.release()?;

        debug!(collection = %self.name, %id, "document created");
        Ok(id)
    }

    /// Draws identifiers until one is unused. Requires the exclusive lock.
    fn fresh_id<G>(&self, lock: &CollectionLock, generate: &mut G) -> CoreResult<Id>
    where
        G: FnMut() -> CoreResult<Id>,
    {
        for attempt in 1..=self.id_attempts {
            let id = generate()?;
            if !reader::exists(lock, id.as_str())? {
                return Ok(id);
            }
            warn!(collection = %self.name, %id, attempt, "generated identifier already in use");
        }
        Err(CoreError::IdentifierCollision {
            collection: self.name.clone(),
            attempts: self.id_attempts,
        })
    }

    /// Reads a document's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] if the document does not exist.
    pub fn read(&self, id: &Id) -> CoreResult<Vec<u8>> {
        let Some(lock) = self.lock_existing(LockMode::Shared)? else {
            return Err(self.not_found(id));
        };

        let data = reader::read(&lock, id.as_str()).map_err(|e| self.document_error(id, e))?;
        lock.release()?;
        Ok(data)
    }

    /// Replaces an existing document's bytes. The identifier is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] if the document does not exist.
    pub fn update(&self, id: &Id, data: &[u8]) -> CoreResult<()> {
        let Some(lock) = self.lock_existing(LockMode::Exclusive)? else {
            return Err(self.not_found(id));
        };

        if !reader::exists(&lock, id.as_str())? {
            return Err(self.not_found(id));
        }
        self.writer.write(&lock, id.as_str(), data)?;
        lock.release()?;

        debug!(collection = %self.name, %id, "document updated");
        Ok(())
    }

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentNotFound`] if the document does not
    /// exist, so a mistyped identifier or a lost race is never silent.
    pub fn delete(&self, id: &Id) -> CoreResult<()> {
        let Some(lock) = self.lock_existing(LockMode::Exclusive)? else {
            return Err(self.not_found(id));
        };

        self.writer
            .delete(&lock, id.as_str())
            .map_err(|e| self.document_error(id, e))?;
        lock.release()?;

        debug!(collection = %self.name, %id, "document deleted");
        Ok(())
    }

    /// Lists the identifiers of all documents.
    ///
    /// The result is a snapshot taken under a shared lock. Order follows
    /// directory enumeration and may differ between calls.
    pub fn list(&self) -> CoreResult<Vec<Id>> {
        let Some(lock) = self.lock_existing(LockMode::Shared)? else {
            return Ok(Vec::new());
        };

        let ids = self.ids(&lock)?;
        lock.release()?;
        Ok(ids)
    }

    /// Returns true if the document exists.
    pub fn exists(&self, id: &Id) -> CoreResult<bool> {
        let Some(lock) = self.lock_existing(LockMode::Shared)? else {
            return Ok(false);
        };

        let found = reader::exists(&lock, id.as_str())?;
        lock.release()?;
        Ok(found)
    }

    /// Returns the number of documents.
    pub fn count(&self) -> CoreResult<usize> {
        Ok(self.list()?.len())
    }

    /// Removes temporary files left by writers that crashed mid-write.
    ///
    /// Returns the number of files removed.
    pub fn sweep_temp_files(&self) -> CoreResult<usize> {
        let Some(lock) = self.lock_existing(LockMode::Exclusive)? else {
            return Ok(0);
        };

        let removed = reader::sweep_temp_files(&lock)?;
        lock.release()?;
        Ok(removed)
    }

    /// Document identifiers present under `lock`; other files are ignored.
    pub(crate) fn ids(&self, lock: &CollectionLock) -> CoreResult<Vec<Id>> {
        Ok(reader::entries(lock)?
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect())
    }

    /// Acquires a lock on the collection, honoring the configured timeout.
    pub(crate) fn lock(&self, mode: LockMode) -> CoreResult<CollectionLock> {
        match self.lock_timeout {
            None => Ok(CollectionLock::acquire(&self.dir, mode)?),
            Some(timeout) => CollectionLock::acquire_timeout(&self.dir, mode, timeout)?
                .ok_or_else(|| CoreError::LockTimeout {
                    collection: self.name.clone(),
                }),
        }
    }

    /// Locks a collection that has been written before.
    ///
    /// Returns `None`, without creating anything, if the directory does
    /// not exist.
    pub(crate) fn lock_existing(&self, mode: LockMode) -> CoreResult<Option<CollectionLock>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }
        match self.lock(mode) {
            Ok(lock) => Ok(Some(lock)),
            // Removed externally between the check and the lock.
            Err(CoreError::LockUnavailable { .. }) if !self.dir.is_dir() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn not_found(&self, id: &Id) -> CoreError {
        CoreError::document_not_found(&self.name, id)
    }

    pub(crate) fn document_error(&self, id: &Id, err: StorageError) -> CoreError {
        if err.is_not_found() {
            self.not_found(id)
        } else {
            err.into()
        }
    }
}
