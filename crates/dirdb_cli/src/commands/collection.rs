//! Collection commands.

use super::CommandResult;
use dirdb_core::{Database, Id};
use serde::Serialize;
use tracing::info;

/// Listing output.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Collection name.
    pub collection: String,
    /// Number of documents.
    pub count: usize,
    /// Document identifiers.
    pub ids: Vec<Id>,
}

/// Runs the list command.
pub fn list(db: &Database, collection: &str, format: &str) -> CommandResult {
    let mut ids = db.collection(collection)?.list()?;
    ids.sort();

    match format {
        "json" => {
            let result = ListResult {
                collection: collection.to_string(),
                count: ids.len(),
                ids,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            for id in ids {
                println!("{id}");
            }
        }
        other => return Err(format!("unknown format: {other}").into()),
    }
    Ok(())
}

/// Runs the collections command.
pub fn collections(db: &Database, format: &str) -> CommandResult {
    let names = db.collection_names()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&names)?),
        "text" => {
            for name in names {
                println!("{name}");
            }
        }
        other => return Err(format!("unknown format: {other}").into()),
    }
    Ok(())
}

/// Runs the sweep command.
pub fn sweep(db: &Database, collection: &str) -> CommandResult {
    let removed = db.collection(collection)?.sweep_temp_files()?;
    info!(collection, removed, "swept temporary files");
    println!("{removed}");
    Ok(())
}
