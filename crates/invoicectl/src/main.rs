//! invoicectl - command-line access to an invoice store

mod handler;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invoicedb::{Backend, DatabaseConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::handler::CommandHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file; flags and environment variables override it
    #[arg(short, long, env = "INVOICEDB_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend: in-memory, in-file or mongodb
    #[arg(short, long, env = "INVOICEDB_BACKEND")]
    backend: Option<Backend>,

    /// Backing file of the in-file backend
    #[arg(short, long, env = "INVOICEDB_FILE")]
    file: Option<PathBuf>,

    /// MongoDB connection string
    #[arg(long, env = "INVOICEDB_MONGO_URI")]
    mongo_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "INVOICEDB_MONGO_DATABASE")]
    mongo_database: Option<String>,

    /// MongoDB collection name
    #[arg(long, env = "INVOICEDB_MONGO_COLLECTION")]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Store operation to run
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Save invoices from a JSON file (object or array), or stdin
    Save {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
    },
    /// Print the invoice with this id, or null
    Get {
        /// Invoice id
        id: String,
    },
    /// Print whether an invoice with this id exists
    Exists {
        /// Invoice id
        id: String,
    },
    /// Print stored invoices, optionally filtered by party name
    List {
        /// Only invoices issued by this seller
        #[arg(long, conflicts_with = "buyer")]
        seller: Option<String>,
        /// Only invoices issued to this buyer
        #[arg(long)]
        buyer: Option<String>,
    },
    /// Print the number of stored invoices
    Count,
    /// Delete the invoice with this id
    Delete {
        /// Invoice id
        id: String,
    },
    /// Delete every invoice
    Clear,
}

impl Args {
    fn database_config(&self) -> Result<DatabaseConfig> {
        let mut config = match &self.config {
            Some(path) => DatabaseConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DatabaseConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(file) = &self.file {
            config.file_path = file.clone();
        }
        if let Some(uri) = &self.mongo_uri {
            config.mongo.uri = uri.clone();
        }
        if let Some(database) = &self.mongo_database {
            config.mongo.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.mongo.collection = collection.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Logs go to stderr, stdout carries JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.database_config()?;
    debug!(?config, "resolved database config");

    let db = config
        .open()
        .with_context(|| format!("Failed to open {} invoice database", config.backend))?;

    let handler = CommandHandler::new(db);
    let output = handler.handle(&args.command)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to render output")?
    );
    Ok(())
}
