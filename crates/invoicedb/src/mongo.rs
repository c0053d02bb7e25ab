//! MongoDB invoice store
//!
//! Invoices are stored as documents of one collection and addressed by their
//! `id` field; MongoDB's own `_id` is left to the server. Queries return
//! documents in natural order, which follows insertion for a collection that
//! only sees appends and in-place replacements.

use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Collection};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::MongoConfig;
use crate::database::{assign_id, InvoiceDatabase};
use crate::error::{Result, StorageError};
use crate::model::{Invoice, InvoiceField};

/// Invoice store backed by a MongoDB collection
pub struct MongoDatabase {
    collection: Collection<Invoice>,
    lock: Mutex<()>,
}

fn failed(context: impl Into<String>) -> impl FnOnce(mongodb::error::Error) -> StorageError {
    let context = context.into();
    move |e| StorageError::Database {
        context,
        message: e.to_string(),
    }
}

fn by_id(id: &str) -> Document {
    doc! { "id": id }
}

impl MongoDatabase {
    /// Connect to the configured collection.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here.
    pub fn connect(config: &MongoConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri).map_err(failed("connect"))?;
        let collection = client
            .database(&config.database)
            .collection::<Invoice>(&config.collection);

        info!(
            database = %config.database,
            collection = %config.collection,
            "using mongodb invoice collection"
        );
        Ok(Self::with_collection(collection))
    }

    /// Wrap an existing collection handle
    pub fn with_collection(collection: Collection<Invoice>) -> Self {
        Self {
            collection,
            lock: Mutex::new(()),
        }
    }

    fn stored_ids(&self) -> Result<Vec<String>> {
        let cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(doc! {})
            .projection(doc! { "id": 1 })
            .run()
            .map_err(failed("list invoice ids"))?;

        let mut ids = Vec::new();
        for document in cursor {
            let document = document.map_err(failed("list invoice ids"))?;
            if let Ok(id) = document.get_str("id") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    fn find(&self, filter: Document, context: &str) -> Result<Vec<Invoice>> {
        let cursor = self
            .collection
            .find(filter)
            .run()
            .map_err(failed(context))?;

        cursor
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(failed(context))
    }
}

impl InvoiceDatabase for MongoDatabase {
    fn save(&self, mut invoice: Invoice) -> Result<Invoice> {
        let _guard = self.lock.lock();

        if !invoice.has_id() {
            let ids = self.stored_ids()?;
            assign_id(&mut invoice, ids.iter().map(String::as_str))?;
        }
        debug!(id = %invoice.id, "saving invoice");

        self.collection
            .replace_one(by_id(&invoice.id), &invoice)
            .upsert(true)
            .run()
            .map_err(failed(format!("save invoice {:?}", invoice.id)))?;
        Ok(invoice)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let _guard = self.lock.lock();
        self.collection
            .find_one(by_id(id))
            .run()
            .map_err(failed(format!("find invoice {:?}", id)))
    }

    fn exists_by_id(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock();
        let matches = self
            .collection
            .count_documents(by_id(id))
            .limit(1)
            .run()
            .map_err(failed(format!("check invoice {:?}", id)))?;
        Ok(matches > 0)
    }

    fn find_all(&self) -> Result<Vec<Invoice>> {
        let _guard = self.lock.lock();
        self.find(doc! {}, "list invoices")
    }

    fn find_all_by_field(&self, field: InvoiceField, value: &str) -> Result<Vec<Invoice>> {
        let _guard = self.lock.lock();
        let mut filter = Document::new();
        filter.insert(field.path(), value);
        self.find(filter, &format!("search invoices by {} {:?}", field, value))
    }

    fn count(&self) -> Result<u64> {
        let _guard = self.lock.lock();
        self.collection
            .count_documents(doc! {})
            .run()
            .map_err(failed("count invoices"))
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock();
        debug!(id, "deleting invoice");
        let removed = self
            .collection
            .find_one_and_delete(by_id(id))
            .run()
            .map_err(failed(format!("delete invoice {:?}", id)))?;

        match removed {
            Some(_) => Ok(()),
            None => Err(StorageError::InvoiceNotFound(id.to_string())),
        }
    }

    fn delete_all(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.collection
            .delete_many(doc! {})
            .run()
            .map_err(failed("delete all invoices"))?;
        Ok(())
    }
}
