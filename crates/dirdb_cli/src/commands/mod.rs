//! CLI command implementations.

pub mod collection;
pub mod document;

use dirdb_core::{Config, Database};
use std::error::Error;
use std::io::Read;
use std::path::Path;

/// Result type for commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

/// Opens the database at `path`.
pub fn open(path: &Path, no_sync: bool) -> CommandResult<Database> {
    let config = Config::default().sync_writes(!no_sync);
    Ok(Database::open_with_config(path, config)?)
}

/// Returns the JSON payload from the argument or stdin, validated and
/// compacted.
pub fn payload(arg: Option<String>) -> CommandResult<Vec<u8>> {
    let text = match arg {
        Some(text) => text,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("invalid JSON document: {e}"))?;
    Ok(serde_json::to_vec(&value)?)
}
