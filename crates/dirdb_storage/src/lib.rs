//! # DirDB Storage
//!
//! Filesystem primitives for DirDB collections.
//!
//! This crate is the concurrency and consistency layer underneath
//! `dirdb_core`. It treats documents as **opaque byte files** and knows
//! nothing about identifiers or JSON.
//!
//! ## Components
//!
//! - [`CollectionLock`] - shared/exclusive advisory lock on one collection,
//!   honored across processes
//! - [`AtomicWriter`] - write-temp-then-rename document writes and deletes
//! - [`reader`] - reads and directory snapshots under a held lock
//!
//! ## Example
//!
//! ```no_run
//! use dirdb_storage::{reader, AtomicWriter, CollectionLock};
//! use std::path::Path;
//!
//! let dir = Path::new("db/users");
//! let lock = CollectionLock::exclusive(dir)?;
//! AtomicWriter::default().write(&lock, "0123456789abcdef", br#"{"name":"Alice"}"#)?;
//! let data = reader::read(&lock, "0123456789abcdef")?;
//! lock.release()?;
//! # Ok::<(), dirdb_storage::StorageError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod lock;
pub mod reader;
mod writer;

pub use error::{StorageError, StorageResult};
pub use lock::{CollectionLock, LockMode, LOCK_FILE};
pub use writer::{AtomicWriter, TEMP_PREFIX};
