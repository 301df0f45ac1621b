//! DirDB CLI
//!
//! Command-line access to a DirDB database directory.
//!
//! # Commands
//!
//! - `create` - Store a new JSON document and print its identifier
//! - `read` - Print a document
//! - `update` - Replace a document
//! - `delete` - Remove a document
//! - `list` - List document identifiers in a collection
//! - `collections` - List collections
//! - `sweep` - Remove temporary files left by crashed writers

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DirDB command-line document tools.
#[derive(Parser)]
#[command(name = "dirdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Skip fsync on writes
    #[arg(global = true, long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new JSON document and print its identifier
    Create {
        /// Collection name
        collection: String,

        /// JSON document (read from stdin if omitted)
        json: Option<String>,
    },

    /// Print a document
    Read {
        /// Collection name
        collection: String,

        /// Document identifier
        id: String,

        /// Pretty-print the document
        #[arg(long)]
        pretty: bool,
    },

    /// Replace a document
    Update {
        /// Collection name
        collection: String,

        /// Document identifier
        id: String,

        /// JSON document (read from stdin if omitted)
        json: Option<String>,
    },

    /// Remove a document
    Delete {
        /// Collection name
        collection: String,

        /// Document identifier
        id: String,
    },

    /// List document identifiers in a collection
    List {
        /// Collection name
        collection: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List collections
    Collections {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove temporary files left by crashed writers
    Sweep {
        /// Collection name
        collection: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("DirDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("DirDB Core v{}", dirdb_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Database path required (--path)")?;
    let db = commands::open(&path, cli.no_sync)?;

    match cli.command {
        Commands::Create { collection, json } => {
            commands::document::create(&db, &collection, json)?;
        }
        Commands::Read {
            collection,
            id,
            pretty,
        } => {
            commands::document::read(&db, &collection, &id, pretty)?;
        }
        Commands::Update {
            collection,
            id,
            json,
        } => {
            commands::document::update(&db, &collection, &id, json)?;
        }
        Commands::Delete { collection, id } => {
            commands::document::delete(&db, &collection, &id)?;
        }
        Commands::List { collection, format } => {
            commands::collection::list(&db, &collection, &format)?;
        }
        Commands::Collections { format } => {
            commands::collection::collections(&db, &format)?;
        }
        Commands::Sweep { collection } => {
            commands::collection::sweep(&db, &collection)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
