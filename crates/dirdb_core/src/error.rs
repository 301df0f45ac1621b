//! Error types for DirDB core.

use crate::id::Id;
use dirdb_storage::StorageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DirDB operations.
///
/// Lock contention is not an error: acquiring a busy collection blocks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem fault (permission denied, disk full, invalid path).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No document with this identifier exists in the collection.
    #[error("document {id} not found in collection {collection}")]
    DocumentNotFound {
        /// Collection searched.
        collection: String,
        /// Identifier that was not found.
        id: Id,
    },

    /// The collection lock file could not be opened or created.
    #[error("lock unavailable: {}", path.display())]
    LockUnavailable {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// The configured lock timeout expired.
    #[error("timed out waiting for lock on collection {collection}")]
    LockTimeout {
        /// Collection that stayed locked.
        collection: String,
    },

    /// The operating system entropy source failed.
    #[error("identifier generator unavailable: {message}")]
    GeneratorUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// Every generated identifier was already taken.
    #[error("identifier collision in collection {collection} after {attempts} attempts")]
    IdentifierCollision {
        /// Collection written to.
        collection: String,
        /// Number of identifiers tried.
        attempts: u32,
    },

    /// String is not a valid document identifier.
    #[error("invalid identifier: {value:?}")]
    InvalidId {
        /// The rejected value.
        value: String,
    },

    /// Name cannot be used as a collection name.
    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Database root does not exist and creation was disabled.
    #[error("database not found: {}", path.display())]
    DatabaseNotFound {
        /// Root path.
        path: PathBuf,
    },

    /// Database root exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// Root path.
        path: PathBuf,
    },

    /// JSON (de)serialization error in the typed API.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl CoreError {
    /// Creates a document not found error.
    pub fn document_not_found(collection: impl Into<String>, id: &Id) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            id: *id,
        }
    }

    /// Creates an invalid identifier error.
    pub fn invalid_id(value: impl Into<String>) -> Self {
        Self::InvalidId {
            value: value.into(),
        }
    }

    /// Creates an invalid collection name error.
    pub fn invalid_collection_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidCollectionName {
            name: name.into(),
            reason,
        }
    }

    /// Creates a generator unavailable error.
    pub fn generator_unavailable(message: impl Into<String>) -> Self {
        Self::GeneratorUnavailable {
            message: message.into(),
        }
    }

    /// Returns true if a document was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. })
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => Self::Io(e),
            StorageError::LockUnavailable { path, .. } => Self::LockUnavailable { path },
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_io_maps_to_io() {
        let err: CoreError = StorageError::Io(io::Error::other("disk full")).into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn storage_lock_unavailable_keeps_path() {
        let err: CoreError = StorageError::LockUnavailable {
            path: PathBuf::from("db/items/LOCK"),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
        .into();
        match err {
            CoreError::LockUnavailable { path } => assert_eq!(path, PathBuf::from("db/items/LOCK")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn not_found_display_names_collection() {
        let id: Id = "0123456789abcdef".parse().unwrap();
        let err = CoreError::document_not_found("items", &id);
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "document 0123456789abcdef not found in collection items"
        );
    }
}
