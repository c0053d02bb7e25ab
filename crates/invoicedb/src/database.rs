//! Storage contract shared by every backend

use crate::error::{Result, StorageError};
use crate::model::{Invoice, InvoiceField};

/// Persistence of invoices keyed by id.
///
/// Implementations are interchangeable: identical calls yield identical
/// outcomes on every backend. Reads report absence as `None`, `false`, an
/// empty list or zero, and fail only when the backing medium does.
/// Mutations fail on medium errors and when `delete_by_id` finds nothing to
/// remove.
///
/// Each implementation serializes its operations behind one lock; there is
/// no per-record locking and no operation is reentrant.
pub trait InvoiceDatabase: Send + Sync {
    /// Inserts or fully replaces an invoice.
    ///
    /// An unseen id is appended after all stored invoices. An existing id is
    /// replaced in place, keeping the order of every other invoice. A blank
    /// id (empty or whitespace only) is replaced with [`next_id`]. Returns
    /// the invoice as stored.
    fn save(&self, invoice: Invoice) -> Result<Invoice>;

    /// Looks up an invoice by id
    fn find_by_id(&self, id: &str) -> Result<Option<Invoice>>;

    /// Checks whether an invoice with this id is stored
    fn exists_by_id(&self, id: &str) -> Result<bool>;

    /// All invoices in storage order
    fn find_all(&self) -> Result<Vec<Invoice>>;

    /// Invoices whose `field` equals `value` exactly (case-sensitive), in
    /// storage order
    fn find_all_by_field(&self, field: InvoiceField, value: &str) -> Result<Vec<Invoice>>;

    /// Invoices issued by the named seller
    fn find_all_by_seller_name(&self, name: &str) -> Result<Vec<Invoice>> {
        self.find_all_by_field(InvoiceField::SellerName, name)
    }

    /// Invoices issued to the named buyer
    fn find_all_by_buyer_name(&self, name: &str) -> Result<Vec<Invoice>> {
        self.find_all_by_field(InvoiceField::BuyerName, name)
    }

    /// Number of stored invoices
    fn count(&self) -> Result<u64>;

    /// Removes an invoice.
    ///
    /// Fails with [`StorageError::InvoiceNotFound`](crate::StorageError::InvoiceNotFound)
    /// when no invoice has this id.
    fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Removes every invoice. Succeeds on an empty store.
    fn delete_all(&self) -> Result<()>;
}

/// Id for an invoice saved without one: one past the largest numeric id.
///
/// Ids that are not decimal numbers do not take part. An empty store
/// starts at "1". Fails with [`StorageError::IdOverflow`] when the largest
/// numeric id is `u64::MAX`.
pub fn next_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<String> {
    let max = ids
        .into_iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    max.checked_add(1)
        .map(|id| id.to_string())
        .ok_or(StorageError::IdOverflow(max))
}

/// Give `invoice` a fresh id when its own is blank
pub(crate) fn assign_id<'a>(
    invoice: &mut Invoice,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    if !invoice.has_id() {
        invoice.id = next_id(ids)?;
    }
    Ok(())
}
