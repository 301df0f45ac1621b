//! Document commands.

use super::{payload, CommandResult};
use dirdb_core::{Database, Id};
use tracing::info;

/// Runs the create command.
pub fn create(db: &Database, collection: &str, json: Option<String>) -> CommandResult {
    let data = payload(json)?;
    let id = db.collection(collection)?.create(&data)?;
    info!(collection, %id, "created document");
    println!("{id}");
    Ok(())
}

/// Runs the read command.
pub fn read(db: &Database, collection: &str, id: &str, pretty: bool) -> CommandResult {
    let id: Id = id.parse()?;
    let data = db.collection(collection)?.read(&id)?;

    if pretty {
        let value: serde_json::Value = serde_json::from_slice(&data)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", String::from_utf8_lossy(&data));
    }
    Ok(())
}

/// Runs the update command.
pub fn update(db: &Database, collection: &str, id: &str, json: Option<String>) -> CommandResult {
    let id: Id = id.parse()?;
    let data = payload(json)?;
    db.collection(collection)?.update(&id, &data)?;
    info!(collection, %id, "updated document");
    Ok(())
}

/// Runs the delete command.
pub fn delete(db: &Database, collection: &str, id: &str) -> CommandResult {
    let id: Id = id.parse()?;
    db.collection(collection)?.delete(&id)?;
    info!(collection, %id, "deleted document");
    Ok(())
}
