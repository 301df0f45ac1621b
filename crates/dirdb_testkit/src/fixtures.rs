//! Test fixtures and database helpers.

use dirdb_core::{Collection, Config, Database, Id};
use std::path::Path;
use tempfile::TempDir;

/// A database in a temporary directory, removed on drop.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Creates a database with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a database that skips fsync, for fast tests.
    pub fn unsynced() -> Self {
        Self::with_config(Config::default().sync_writes(false))
    }

    /// Creates a database with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_with_config(temp_dir.path().join("db"), config)
            .expect("Failed to open database");
        Self {
            db,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the database root.
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Opens a second, independent handle on the same root.
    pub fn reopen(&self) -> Database {
        Database::open_with_config(self.db.path(), self.db.config().clone())
            .expect("Failed to reopen database")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary database.
///
/// # Example
///
/// ```rust,ignore
/// use dirdb_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         let items = db.collection("items").unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::unsynced();
    f(&test_db.db)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database whose `items` collection holds `count` documents
    /// of the form `{"index": i}`.
    pub fn populated_database(count: usize) -> (TestDatabase, Vec<Id>) {
        let test_db = TestDatabase::unsynced();
        let items = test_db.collection("items").expect("valid name");
        let ids = populate(&items, count);
        (test_db, ids)
    }

    /// Creates a database with `collection_count` collections named
    /// `collection_0`, `collection_1`, ... each holding one document.
    pub fn multi_collection_database(collection_count: usize) -> (TestDatabase, Vec<String>) {
        let test_db = TestDatabase::unsynced();
        let names: Vec<String> = (0..collection_count)
            .map(|i| format!("collection_{i}"))
            .collect();

        for name in &names {
            let collection = test_db.collection(name).expect("valid name");
            populate(&collection, 1);
        }

        (test_db, names)
    }

    /// Inserts `count` numbered documents into `collection`.
    pub fn populate(collection: &Collection, count: usize) -> Vec<Id> {
        (0..count)
            .map(|i| {
                collection
                    .create(format!(r#"{{"index":{i}}}"#).as_bytes())
                    .expect("Failed to create document")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::scenarios::*;
    use super::*;

    #[test]
    fn temp_database_is_usable() {
        let test_db = TestDatabase::new();
        let items = test_db.collection("items").unwrap();
        let id = items.create(b"{}").unwrap();

        let other = test_db.reopen();
        assert_eq!(other.collection("items").unwrap().read(&id).unwrap(), b"{}");
    }

    #[test]
    fn with_temp_db_runs_closure() {
        let count = with_temp_db(|db| {
            let items = db.collection("items").unwrap();
            items.create(b"1").unwrap();
            items.create(b"2").unwrap();
            items.count().unwrap()
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn populated_database_has_documents() {
        let (test_db, ids) = populated_database(10);
        let items = test_db.collection("items").unwrap();

        assert_eq!(items.count().unwrap(), 10);
        let first: serde_json::Value = serde_json::from_slice(&items.read(&ids[0]).unwrap()).unwrap();
        assert_eq!(first["index"], 0);
    }

    #[test]
    fn multi_collection_database_creates_all() {
        let (test_db, names) = multi_collection_database(3);
        assert_eq!(test_db.collection_names().unwrap(), names);
    }
}
