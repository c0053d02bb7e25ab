//! Command handler over an invoice store

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use invoicedb::{Invoice, InvoiceDatabase};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::Command;

/// Invoices accepted by `save`
#[derive(Deserialize)]
#[serde(untagged)]
enum InvoiceInput {
    One(Invoice),
    Many(Vec<Invoice>),
}

impl InvoiceInput {
    fn into_vec(self) -> Vec<Invoice> {
        match self {
            InvoiceInput::One(invoice) => vec![invoice],
            InvoiceInput::Many(invoices) => invoices,
        }
    }
}

pub struct CommandHandler {
    db: Arc<dyn InvoiceDatabase>,
}

impl CommandHandler {
    pub fn new(db: Arc<dyn InvoiceDatabase>) -> Self {
        Self { db }
    }

    /// Run one command and return its JSON output
    pub fn handle(&self, command: &Command) -> Result<Value> {
        match command {
            Command::Save { input } => {
                let raw = read_input(input.as_deref())?;
                self.handle_save(&raw)
            }
            Command::Get { id } => {
                let invoice = self.db.find_by_id(id)?;
                Ok(serde_json::to_value(invoice)?)
            }
            Command::Exists { id } => Ok(json!(self.db.exists_by_id(id)?)),
            Command::List { seller, buyer } => {
                let invoices = match (seller, buyer) {
                    (Some(name), _) => self.db.find_all_by_seller_name(name)?,
                    (None, Some(name)) => self.db.find_all_by_buyer_name(name)?,
                    (None, None) => self.db.find_all()?,
                };
                Ok(serde_json::to_value(invoices)?)
            }
            Command::Count => Ok(json!(self.db.count()?)),
            Command::Delete { id } => {
                self.db
                    .delete_by_id(id)
                    .with_context(|| format!("Failed to delete invoice {}", id))?;
                info!(id = %id, "deleted invoice");
                Ok(json!({ "deleted": id }))
            }
            Command::Clear => {
                self.db.delete_all()?;
                Ok(json!({ "deleted": "all" }))
            }
        }
    }

    fn handle_save(&self, raw: &str) -> Result<Value> {
        let input: InvoiceInput =
            serde_json::from_str(raw).context("Failed to parse invoice JSON")?;

        let mut saved = Vec::new();
        for invoice in input.into_vec() {
            let invoice = self.db.save(invoice)?;
            info!(id = %invoice.id, "saved invoice");
            saved.push(invoice);
        }
        Ok(serde_json::to_value(saved)?)
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}
