//! # DirDB Testkit
//!
//! Test utilities for DirDB.
//!
//! This crate provides:
//! - Temporary database fixtures
//! - Property-based test generators using proptest
//! - Multi-threaded stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dirdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         let items = db.collection("items").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
