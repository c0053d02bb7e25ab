//! Line codec for stored invoices
//!
//! File format:
//! ```text
//! {"id":"1","issued_date":"2024-03-01",...}\n
//! {"id":"2","issued_date":"2024-03-02",...}\n
//! ```
//!
//! One JSON object per line, no header, no trailer. `serde_json` escapes
//! control characters inside strings, so an encoded invoice never spans
//! more than one line.

use nom::{
    bytes::complete::take_until,
    character::complete::char,
    multi::many0,
    sequence::terminated,
    IResult,
};
use thiserror::Error;

use crate::error::{Result, StorageError};
use crate::model::Invoice;

/// Why a stored line is not a record
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Line is not a JSON invoice
    #[error("malformed invoice line: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Line decodes but carries a blank id, so it cannot be addressed
    #[error("invoice line has a blank id")]
    MissingId,
}

/// Encodes an invoice as a single line, without the trailing newline
pub fn encode(invoice: &Invoice) -> Result<String> {
    serde_json::to_string(invoice).map_err(|source| StorageError::Encode {
        id: invoice.id.clone(),
        source,
    })
}

/// Decodes one line produced by [`encode`]
pub fn decode(line: &str) -> std::result::Result<Invoice, DecodeError> {
    let invoice: Invoice = serde_json::from_str(line)?;
    if !invoice.has_id() {
        return Err(DecodeError::MissingId);
    }
    Ok(invoice)
}

/// Parse a single `\n`-terminated line
fn parse_line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_until("\n"), char('\n'))(input)
}

/// Split raw file contents into lines.
///
/// A final line without a terminating newline is still returned, and a
/// trailing `\r` is dropped from every line.
pub(crate) fn split_lines(input: &[u8]) -> Vec<&[u8]> {
    let (rest, mut lines) = match many0(parse_line)(input) {
        Ok(parsed) => parsed,
        Err(_) => (input, Vec::new()),
    };
    if !rest.is_empty() {
        lines.push(rest);
    }

    lines
        .into_iter()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}
