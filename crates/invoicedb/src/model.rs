//! Invoice records
//!
//! The storage layer treats [`Invoice`] as an opaque record keyed by `id`;
//! only the seller and buyer names are ever inspected, for searches.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monetary amount in minor units (1/100 of the currency unit)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    /// Amount from whole units and cents, e.g. `Money::new(12, 50)` is 12.50
    pub fn new(units: i64, cents: i64) -> Self {
        Money(units * 100 + cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Unit of measure of an invoice entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Hour of work
    Hour,
    /// Single piece
    Piece,
    /// Kilogram
    Kilogram,
    /// Liter
    Liter,
    /// Meter
    Meter,
}

/// VAT rate applied to an invoice entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vat {
    /// 23%
    Vat23,
    /// 8%
    Vat8,
    /// 5%
    Vat5,
    /// 0%
    Vat0,
}

impl Vat {
    /// Rate in percent
    pub fn percent(self) -> u8 {
        match self {
            Vat::Vat23 => 23,
            Vat::Vat8 => 8,
            Vat::Vat5 => 5,
            Vat::Vat0 => 0,
        }
    }
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street name
    pub street: String,
    /// Building and apartment number
    pub number: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
}

/// How to reach a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// E-mail address
    pub email: String,
    /// Phone number
    pub phone_number: String,
    /// Web site
    pub website: String,
    /// Registered address
    pub address: Address,
}

/// Bank account of a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNumber {
    /// International form of the account number
    pub iban_number: String,
    /// Domestic form of the account number
    pub local_number: String,
}

/// Party of an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Registered name, used for seller/buyer searches
    pub name: String,
    /// Tax identification number
    pub tax_id: String,
    /// Bank account
    pub account_number: AccountNumber,
    /// Contact details
    pub contact_details: ContactDetails,
}

/// Line item of an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceEntry {
    /// Description of the sold item or service
    pub item: String,
    /// Quantity sold
    pub quantity: u64,
    /// Unit of measure
    pub unit: UnitType,
    /// Unit price, net
    pub price: Money,
    /// VAT rate
    pub vat_rate: Vat,
    /// Net value of the entry
    pub net_value: Money,
    /// Gross value of the entry
    pub gross_value: Money,
}

impl InvoiceEntry {
    /// Creates an entry, deriving net and gross values.
    ///
    /// VAT is rounded half away from zero to the nearest minor unit.
    pub fn new(
        item: impl Into<String>,
        quantity: u64,
        unit: UnitType,
        price: Money,
        vat_rate: Vat,
    ) -> Self {
        let net = price.0 * quantity as i64;
        let tax = net * i64::from(vat_rate.percent());
        let tax = (tax + tax.signum() * 50) / 100;

        Self {
            item: item.into(),
            quantity,
            unit,
            price,
            vat_rate,
            net_value: Money(net),
            gross_value: Money(net + tax),
        }
    }
}

/// Stored business record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique key within a store. Blank means "assign one on save".
    pub id: String,
    /// Issue date
    pub issued_date: NaiveDate,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Selling party
    pub seller: Company,
    /// Buying party
    pub buyer: Company,
    /// Line items, in order
    pub entries: Vec<InvoiceEntry>,
}

impl Invoice {
    /// Whether the invoice carries an id. Whitespace alone is not an id.
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Name of the selling company
    pub fn seller_name(&self) -> &str {
        &self.seller.name
    }

    /// Name of the buying company
    pub fn buyer_name(&self) -> &str {
        &self.buyer.name
    }

    /// Value of a searchable field
    pub fn field(&self, field: InvoiceField) -> &str {
        match field {
            InvoiceField::SellerName => self.seller_name(),
            InvoiceField::BuyerName => self.buyer_name(),
        }
    }
}

/// Field an invoice search can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceField {
    /// `seller.name`
    SellerName,
    /// `buyer.name`
    BuyerName,
}

impl InvoiceField {
    /// Dotted path of the field inside a serialized invoice
    pub fn path(self) -> &'static str {
        match self {
            InvoiceField::SellerName => "seller.name",
            InvoiceField::BuyerName => "buyer.name",
        }
    }
}

impl fmt::Display for InvoiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
