//! Backend selection
//!
//! A [`DatabaseConfig`] names the backend and where it keeps its data, and
//! opens it as a shared [`InvoiceDatabase`] handle.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::InvoiceDatabase;
use crate::error::{Result, StorageError};
use crate::in_file::InFileDatabase;
use crate::in_memory::InMemoryDatabase;

/// Default backing file of the line-file backend
pub const DEFAULT_FILE_PATH: &str = "data/invoices.db";

/// Storage backend kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Process-local map, lost on exit
    InMemory,
    /// One invoice per line of a text file
    #[default]
    InFile,
    /// MongoDB collection (requires the `mongodb` feature)
    Mongodb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::InMemory => "in-memory",
            Backend::InFile => "in-file",
            Backend::Mongodb => "mongodb",
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in-memory" | "memory" => Ok(Backend::InMemory),
            "in-file" | "file" => Ok(Backend::InFile),
            "mongodb" | "mongo" => Ok(Backend::Mongodb),
            other => Err(StorageError::Config(format!(
                "unknown backend {:?}, expected in-memory, in-file or mongodb",
                other
            ))),
        }
    }
}

/// MongoDB connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Connection string
    pub uri: String,
    /// Database name
    pub database: String,
    /// Collection holding the invoices
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "invoicedb".to_string(),
            collection: "invoices".to_string(),
        }
    }
}

/// Which backend to open and where its data lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend kind
    pub backend: Backend,
    /// Backing file of the `in-file` backend
    pub file_path: PathBuf,
    /// Settings of the `mongodb` backend
    pub mongo: MongoConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            mongo: MongoConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(StorageError::io(format!("read config {}", path.display())))?;

        serde_json::from_str(&contents).map_err(|e| {
            StorageError::Config(format!("{}: {}", path.display(), e))
        })
    }

    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn InvoiceDatabase>> {
        info!(backend = %self.backend, "opening invoice database");

        match self.backend {
            Backend::InMemory => Ok(Arc::new(InMemoryDatabase::new())),
            Backend::InFile => Ok(Arc::new(InFileDatabase::open(&self.file_path)?)),
            #[cfg(feature = "mongodb")]
            Backend::Mongodb => Ok(Arc::new(crate::mongo::MongoDatabase::connect(&self.mongo)?)),
            #[cfg(not(feature = "mongodb"))]
            Backend::Mongodb => Err(StorageError::Config(
                "mongodb backend not compiled in, rebuild with --features mongodb".to_string(),
            )),
        }
    }
}
