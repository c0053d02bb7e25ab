//! Error types for invoicedb

use std::io;

use thiserror::Error;

/// Result type alias for invoicedb operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure of a storage operation.
///
/// Absence is never an error on the read path: lookups return `None`,
/// `false`, an empty list or zero. Only genuine failures and deleting an
/// id that is not stored end up here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while touching the backing medium
    #[error("failed to {context}: {source}")]
    Io {
        /// Operation that failed, including the id or field involved
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Invoice could not be serialized
    #[error("failed to encode invoice {id:?}: {source}")]
    Encode {
        /// Id of the invoice being written
        id: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Delete target is not stored
    #[error("there is no invoice with id {0:?} in the database, nothing was removed")]
    InvoiceNotFound(String),

    /// No id is left to assign after the largest stored numeric id
    #[error("cannot assign an invoice id: stored id {0} is the largest possible")]
    IdOverflow(u64),

    /// Document store failure
    #[error("document store failed to {context}: {message}")]
    Database {
        /// Operation that failed, including the id or field involved
        context: String,
        /// Driver error message
        message: String,
    },

    /// Invalid backend configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StorageError {
    /// Wraps an I/O error with the operation it interrupted.
    ///
    /// Meant for `map_err`: `file.sync_all().map_err(StorageError::io("sync invoices"))`.
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| StorageError::Io { context, source }
    }

    /// Returns true when the error reports a missing delete target.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::InvoiceNotFound(_))
    }
}
