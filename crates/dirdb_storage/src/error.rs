//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested document file does not exist.
    #[error("document file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The lock file for a collection could not be opened or created.
    ///
    /// This is distinct from contention, which blocks instead of failing.
    #[error("lock unavailable at {}: {source}", path.display())]
    LockUnavailable {
        /// Path of the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A mutation was attempted while holding only a shared lock.
    #[error("exclusive lock required to modify {}", path.display())]
    NotExclusive {
        /// Collection directory.
        path: PathBuf,
    },
}

impl StorageError {
    /// Returns true if this error reports a missing document file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
