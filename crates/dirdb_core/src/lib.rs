//! # DirDB Core
//!
//! A directory-backed JSON document store that lives inside the calling
//! process.
//!
//! This crate provides:
//! - [`Database`]: a root directory handing out collections by name
//! - [`Collection`]: create/read/update/delete/list over documents, plus a
//!   typed `serde_json` layer
//! - [`Id`]: collision-resistant 16-character hex identifiers
//!
//! Several processes may open the same root at once. Each operation takes a
//! shared (read) or exclusive (write) advisory lock on its collection, and
//! every write goes through write-temp-then-rename, so no reader ever sees
//! a partially written document.
//!
//! ## Example
//!
//! ```no_run
//! use dirdb_core::Database;
//!
//! let db = Database::open("test.db")?;
//! let items = db.collection("items")?;
//!
//! let id = items.create(br#"{"a":1}"#)?;
//! items.update(&id, br#"{"a":2}"#)?;
//! assert_eq!(items.read(&id)?, br#"{"a":2}"#);
//! items.delete(&id)?;
//! # Ok::<(), dirdb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod error;
mod id;
mod name;

pub use collection::{Collection, Item};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use id::{Id, ID_LEN};
pub use name::{is_valid_collection_name, validate_collection_name, MAX_NAME_LEN};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
