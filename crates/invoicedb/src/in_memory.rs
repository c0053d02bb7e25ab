//! In-memory invoice store
//!
//! Invoices live in an insertion-ordered map, so iteration order matches
//! the order a line file would have after the same sequence of saves.

use ahash::RandomState;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::database::{assign_id, InvoiceDatabase};
use crate::error::{Result, StorageError};
use crate::model::{Invoice, InvoiceField};

/// Invoice store backed by an id-keyed map
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    invoices: Mutex<IndexMap<String, Invoice, RandomState>>,
}

impl InMemoryDatabase {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceDatabase for InMemoryDatabase {
    fn save(&self, mut invoice: Invoice) -> Result<Invoice> {
        let mut invoices = self.invoices.lock();

        assign_id(&mut invoice, invoices.keys().map(String::as_str))?;
        debug!(id = %invoice.id, "saving invoice");

        // Replacing an existing key keeps its position
        invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(invoice)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self.invoices.lock().get(id).cloned())
    }

    fn exists_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.invoices.lock().contains_key(id))
    }

    fn find_all(&self) -> Result<Vec<Invoice>> {
        Ok(self.invoices.lock().values().cloned().collect())
    }

    fn find_all_by_field(&self, field: InvoiceField, value: &str) -> Result<Vec<Invoice>> {
        Ok(self
            .invoices
            .lock()
            .values()
            .filter(|invoice| invoice.field(field) == value)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.invoices.lock().len() as u64)
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        debug!(id, "deleting invoice");
        match self.invoices.lock().shift_remove(id) {
            Some(_) => Ok(()),
            None => Err(StorageError::InvoiceNotFound(id.to_string())),
        }
    }

    fn delete_all(&self) -> Result<()> {
        self.invoices.lock().clear();
        Ok(())
    }
}
