//! # invoicedb
//!
//! Invoice persistence behind one storage contract, [`InvoiceDatabase`],
//! with interchangeable backends:
//! - [`InMemoryDatabase`]: insertion-ordered map, for tests and light deployments
//! - [`InFileDatabase`]: one JSON invoice per line of a text file
//! - `MongoDatabase`: a MongoDB collection (feature `mongodb`)
//!
//! Reads treat absence as an ordinary result; mutations and I/O failures
//! surface as [`StorageError`]. Malformed lines in a line file are skipped,
//! never reported as errors.

#![warn(missing_docs)]

pub mod codec;
mod config;
mod database;
mod error;
mod in_file;
mod in_memory;
mod model;
#[cfg(feature = "mongodb")]
mod mongo;


pub use config::{Backend, DatabaseConfig, MongoConfig, DEFAULT_FILE_PATH};
pub use database::{next_id, InvoiceDatabase};
pub use error::{Result, StorageError};
pub use in_file::InFileDatabase;
pub use in_memory::InMemoryDatabase;
pub use model::{
    AccountNumber, Address, Company, ContactDetails, Invoice, InvoiceEntry, InvoiceField, Money,
    UnitType, Vat,
};
#[cfg(feature = "mongodb")]
pub use mongo::MongoDatabase;
