//! Database facade.

use crate::collection::Collection;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::name::{is_valid_collection_name, validate_collection_name};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// The main database handle.
///
/// A database is a root directory holding one subdirectory per collection:
///
/// ```text
/// <root>/
/// ├─ users/
/// │  ├─ LOCK
/// │  ├─ 3f9a0c1d2e4b5a67
/// │  └─ 8e1b7c0d9f2a3b45
/// └─ posts/
///    └─ ...
/// ```
///
/// Opening is cheap and holds no lock; any number of handles, in any number
/// of processes, may share a root. Coordination happens per collection and
/// per operation.
///
/// # Example
///
/// ```rust,ignore
/// use dirdb_core::Database;
///
/// let db = Database::open("my_database")?;
/// let users = db.collection("users")?;
/// let id = users.create(br#"{"name":"Alice"}"#)?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// Canonical root directory.
    root: PathBuf,
    /// Configuration.
    config: Config,
}

impl Database {
    /// Opens a database at `path`, creating the directory if needed.
    ///
    /// Opening an existing database is not an error.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotADirectory`] if `path` exists but is not a directory
    /// - [`CoreError::Io`] if the path is inaccessible
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use dirdb_core::{Config, Database};
    ///
    /// let config = Config::default().create_if_missing(false).sync_writes(false);
    /// let db = Database::open_with_config("my_database", config)?;
    /// ```
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();

        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(CoreError::NotADirectory {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !config.create_if_missing {
                    return Err(CoreError::DatabaseNotFound {
                        path: path.to_path_buf(),
                    });
                }
                // Tolerates a concurrent creator.
                fs::create_dir_all(path)?;
                info!(path = %path.display(), "created database directory");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            root: fs::canonicalize(path)?,
            config,
        })
    }

    /// Returns a handle to the collection `name`.
    ///
    /// Nothing is created on disk until the first write.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCollectionName`] if `name` is not a
    /// single portable path segment.
    pub fn collection(&self, name: &str) -> CoreResult<Collection> {
        validate_collection_name(name)?;
        Ok(Collection::new(name, self.root.join(name), &self.config))
    }

    /// Lists the names of collections that have been written to.
    pub fn collection_names(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if is_valid_collection_name(&name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns the canonical root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("nested").join("db");

        let db = Database::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(db.path(), fs::canonicalize(&root).unwrap());
    }

    #[test]
    fn open_is_idempotent() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("db");

        let first = Database::open(&root).unwrap();
        let second = Database::open(&root).unwrap();

        let id = first.collection("items").unwrap().create(b"{}").unwrap();
        assert_eq!(second.collection("items").unwrap().read(&id).unwrap(), b"{}");
    }

    #[test]
    fn open_fails_on_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            Database::open(&file),
            Err(CoreError::NotADirectory { .. })
        ));
    }

    #[test]
    fn open_without_create() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("missing");

        let result = Database::open_with_config(&root, Config::new().create_if_missing(false));
        assert!(matches!(result, Err(CoreError::DatabaseNotFound { .. })));
        assert!(!root.exists());
    }

    #[test]
    fn collection_is_not_created_eagerly() {
        let temp = tempdir().unwrap();
        let db = Database::open(temp.path()).unwrap();

        let items = db.collection("items").unwrap();
        assert_eq!(items.name(), "items");
        assert!(!items.path().exists());
        assert!(db.collection_names().unwrap().is_empty());
    }

    #[test]
    fn collection_rejects_invalid_names() {
        let temp = tempdir().unwrap();
        let db = Database::open(temp.path()).unwrap();

        for name in ["", "..", "a/b", "CON"] {
            assert!(matches!(
                db.collection(name),
                Err(CoreError::InvalidCollectionName { .. })
            ));
        }
    }

    #[test]
    fn collection_names_lists_written_collections() {
        let temp = tempdir().unwrap();
        let db = Database::open(temp.path()).unwrap();

        db.collection("posts").unwrap().create(b"{}").unwrap();
        db.collection("users").unwrap().create(b"{}").unwrap();
        fs::create_dir(temp.path().join(".hidden")).unwrap();
        fs::write(temp.path().join("stray.json"), b"{}").unwrap();

        assert_eq!(db.collection_names().unwrap(), vec!["posts", "users"]);
    }

    #[test]
    fn config_is_passed_to_collections() {
        let temp = tempdir().unwrap();
        let db = Database::open_with_config(temp.path(), Config::new().sync_writes(false)).unwrap();

        assert!(!db.config().sync_writes);
        let id = db.collection("items").unwrap().create(b"[]").unwrap();
        assert_eq!(db.collection("items").unwrap().read(&id).unwrap(), b"[]");
    }
}
