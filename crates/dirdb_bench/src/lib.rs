//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use dirdb_core::{Config, Database};
use tempfile::TempDir;

/// Generate a JSON document whose padding field is `size` bytes long.
pub fn json_document(size: usize) -> Vec<u8> {
    format!(r#"{{"pad":"{}"}}"#, "x".repeat(size)).into_bytes()
}

/// Open a database in a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_database(sync_writes: bool) -> (TempDir, Database) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let db = Database::open_with_config(temp.path(), Config::new().sync_writes(sync_writes))
        .expect("Failed to open database");
    (temp, db)
}
