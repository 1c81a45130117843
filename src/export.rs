//! Ledger export and import as a single JSON document
//!
//! The document is `{ "meta": {...}, "bills": { "<year>": [Bill, ...] } }`
//! with years as string keys. Parsing rejects a document missing either top
//! key instead of guessing at a partial ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{Ledger, LedgerMeta};
use crate::models::Bill;

/// A full ledger serialized for backup or transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Roster, categories, schema version
    pub meta: LedgerMeta,
    /// Bills keyed by calendar year (string keys, JSON objects cannot have
    /// numeric ones)
    pub bills: BTreeMap<String, Vec<Bill>>,
}

/// Build the export document for a ledger
pub fn export_document(ledger: &Ledger) -> ExportDocument {
    let bills = ledger
        .bills_by_year()
        .iter()
        .map(|(year, bills)| (year.to_string(), bills.clone()))
        .collect();
    ExportDocument {
        meta: ledger.meta().clone(),
        bills,
    }
}

/// Serialize a ledger to the export JSON string
pub fn export_json(ledger: &Ledger) -> LedgerResult<String> {
    let document = export_document(ledger);
    let json = serde_json::to_string_pretty(&document)?;
    debug!(bills = ledger.bill_count(), "exported ledger");
    Ok(json)
}

/// Parse an export document, rejecting structurally invalid input
///
/// Both top-level keys must be present; their absence is an
/// [`LedgerError::Import`], not a default-empty ledger.
pub fn parse_document(json: &str) -> LedgerResult<ExportDocument> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| LedgerError::Import(format!("Invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| LedgerError::Import("Export document must be a JSON object".into()))?;
    for key in ["meta", "bills"] {
        if !object.contains_key(key) {
            return Err(LedgerError::Import(format!(
                "Export document is missing the '{}' key",
                key
            )));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| LedgerError::Import(format!("Malformed export document: {}", e)))
}

impl ExportDocument {
    /// Rebuild a ledger from the document
    ///
    /// Year keys must parse as integers; balances are recomputed from the
    /// bills, never read from the document.
    pub fn into_ledger(self) -> LedgerResult<Ledger> {
        let mut bills: BTreeMap<i32, Vec<Bill>> = BTreeMap::new();
        for (year_raw, year_bills) in self.bills {
            let year: i32 = year_raw.parse().map_err(|_| {
                LedgerError::Import(format!("Invalid year key '{}'", year_raw))
            })?;
            bills.insert(year, year_bills);
        }
        Ok(Ledger::from_parts(self.meta, bills))
    }
}
