//! Typed JSON access to a collection.
//!
//! The byte API treats payloads as opaque. These methods layer `serde_json`
//! on top: values are serialized as pretty-printed JSON on write and
//! deserialized into `T` on read.

use super::Collection;
use crate::error::CoreResult;
use crate::id::Id;
use dirdb_storage::{reader, LockMode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A deserialized document together with its identifier.
///
/// When serialized, the `id` is flattened into the document's own fields,
/// so `T` must serialize as a map for `Item<T>` itself to be serialized.
/// Only `data` is ever written to disk.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Item<T> {
    /// Document identifier.
    pub id: Id,
    /// Document content.
    #[serde(flatten)]
    pub data: T,
}

impl<T> Item<T> {
    /// Creates an item.
    pub fn new(id: Id, data: T) -> Self {
        Self { id, data }
    }
}

impl Collection {
    /// Serializes `data` and stores it as a new document.
    pub fn insert_one<T: Serialize>(&self, data: &T) -> CoreResult<Id> {
        let bytes = serde_json::to_vec_pretty(data)?;
        self.create(&bytes)
    }

    /// Reads and deserializes one document.
    pub fn get_one<T: DeserializeOwned>(&self, id: &Id) -> CoreResult<Item<T>> {
        let bytes = self.read(id)?;
        Ok(Item::new(*id, serde_json::from_slice(&bytes)?))
    }

    /// Reads every document that deserializes as `T`.
    ///
    /// **Warning**: This is a full scan of the collection.
    pub fn get_all<T: DeserializeOwned>(&self) -> CoreResult<Vec<Item<T>>> {
        self.find_many(|_| true)
    }

    /// Reads the documents for which `filter` returns `true`.
    ///
    /// The whole scan runs under one shared lock, so it sees a consistent
    /// snapshot. Documents that do not deserialize as `T` are skipped.
    pub fn find_many<T, F>(&self, filter: F) -> CoreResult<Vec<Item<T>>>
    where
        T: DeserializeOwned,
        F: Fn(&Item<T>) -> bool,
    {
        let Some(lock) = self.lock_existing(LockMode::Shared)? else {
            return Ok(Vec::new());
        };

        let mut result = Vec::new();
        for id in self.ids(&lock)? {
            let bytes = reader::read(&lock, id.as_str()).map_err(|e| self.document_error(&id, e))?;
            match serde_json::from_slice(&bytes) {
                Ok(data) => {
                    let item = Item::new(id, data);
                    if filter(&item) {
                        result.push(item);
                    }
                }
                Err(e) => debug!(collection = %self.name, %id, error = %e, "skipping document"),
            }
        }

        lock.release()?;
        Ok(result)
    }

    /// Overwrites an existing document with `item.data`.
    pub fn replace_one<T: Serialize>(&self, item: &Item<T>) -> CoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&item.data)?;
        self.update(&item.id, &bytes)
    }

    /// Reads a document, passes it to `update`, and writes the result back,
    /// all under one exclusive lock.
    ///
    /// Changes the closure makes to `item.id` are ignored.
    pub fn update_by_id<T, U>(&self, id: &Id, update: U) -> CoreResult<()>
    where
        T: DeserializeOwned + Serialize,
        U: FnOnce(&mut Item<T>),
    {
        let Some(lock) = self.lock_existing(LockMode::Exclusive)? else {
            return Err(self.not_found(id));
        };

        let bytes = reader::read(&lock, id.as_str()).map_err(|e| self.document_error(id, e))?;
        let mut item = Item::new(*id, serde_json::from_slice(&bytes)?);
        update(&mut item);
        self.writer
            .write(&lock, id.as_str(), &serde_json::to_vec_pretty(&item.data)?)?;
        lock.release()?;

        debug!(collection = %self.name, %id, "document updated");
        Ok(())
    }

    /// Applies `update` to every document for which `filter` returns `true`.
    ///
    /// Runs under one exclusive lock. Documents that do not deserialize as
    /// `T` are left untouched. Returns the number of documents rewritten.
    pub fn update_many<T, F, U>(&self, filter: F, update: U) -> CoreResult<usize>
    where
        T: DeserializeOwned + Serialize,
        F: Fn(&Item<T>) -> bool,
        U: Fn(&mut Item<T>),
    {
        let Some(lock) = self.lock_existing(LockMode::Exclusive)? else {
            return Ok(0);
        };

        let mut updated = 0;
        for id in self.ids(&lock)? {
            let bytes = reader::read(&lock, id.as_str()).map_err(|e| self.document_error(&id, e))?;
            let Ok(data) = serde_json::from_slice(&bytes) else {
                continue;
            };
            let mut item = Item::new(id, data);
            if filter(&item) {
                update(&mut item);
                self.writer
                    .write(&lock, id.as_str(), &serde_json::to_vec_pretty(&item.data)?)?;
                updated += 1;
            }
        }

        lock.release()?;
        debug!(collection = %self.name, updated, "documents updated");
        Ok(updated)
    }

    /// Deletes one document.
    pub fn delete_one(&self, id: &Id) -> CoreResult<()> {
        self.delete(id)
    }
}
