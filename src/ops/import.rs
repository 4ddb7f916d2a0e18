use std::collections::HashSet;

use crate::model::record::Record;
use crate::ops::validate::validate_import_record;

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not parse import file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("File must contain a JSON array.")]
    NotAnArray,
    #[error("No valid records found in file.")]
    NoValidRecords,
}

/// Result of parsing an import document
#[derive(Debug)]
pub struct ImportReport {
    /// Records that passed the shape check, in file order
    pub records: Vec<Record>,
    /// Entries dropped as invalid or as repeated ids
    pub skipped: usize,
}

impl ImportReport {
    /// "Imported 3 records. Skipped 1 invalid."
    pub fn summary(&self) -> String {
        let mut out = format!("Imported {} records.", self.records.len());
        if self.skipped > 0 {
            out.push_str(&format!(" Skipped {} invalid.", self.skipped));
        }
        out
    }
}

/// Parse a JSON export into records.
///
/// Entries that fail the structural check (or repeat an id already seen) are
/// dropped and counted. The import as a whole is rejected only when nothing
/// survives.
pub fn parse_import(json: &str) -> Result<ImportReport, ImportError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(ImportError::NotAnArray);
    };

    let total = entries.len();
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for entry in entries {
        if !validate_import_record(&entry) {
            continue;
        }
        // Shape passed, but optional fields may still carry the wrong type
        let record: Record = match serde_json::from_value(entry) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "dropping import entry");
                continue;
            }
        };
        if !seen.insert(record.id.clone()) {
            tracing::debug!(id = %record.id, "dropping duplicate import id");
            continue;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(ImportError::NoValidRecords);
    }

    let skipped = total - records.len();
    tracing::info!(imported = records.len(), skipped, "parsed import file");
    Ok(ImportReport { records, skipped })
}

/// Pretty-printed JSON array of records, suitable for `parse_import`
pub fn export_json(records: &[Record]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}
