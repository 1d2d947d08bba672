//! Inspection records loaded from the input CSV.
//!
//! Every CSV row becomes one [`InspectionRecord`]. The header row supplies the
//! field labels verbatim (leading or trailing spaces included), so layout keys
//! must match the CSV headers exactly.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use thiserror::Error;

/// Value rendered for any field that is missing or empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Label of the column holding the owner's name.
pub const OWNER_NAME_FIELD: &str = "ECD Owner Name";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to open CSV file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of inspection answers keyed by question text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionRecord {
    fields: HashMap<String, String>,
}

impl InspectionRecord {
    /// Raw value of a field, `None` when absent or empty.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .get(label)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Value of a field, falling back to [`NOT_AVAILABLE`].
    pub fn value_or_default(&self, label: &str) -> &str {
        self.get(label).unwrap_or(NOT_AVAILABLE)
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.get(OWNER_NAME_FIELD)
    }
}

impl<K, V> FromIterator<(K, V)> for InspectionRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read the whole CSV file into memory, one record per data row, in file order.
pub fn load_records(path: &Path) -> Result<Vec<InspectionRecord>, RecordError> {
    let file = File::open(path).map_err(|source| RecordError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_records(file)
}

/// Decode records from any reader. Short rows simply lack the trailing fields.
pub fn read_records<R: std::io::Read>(reader: R) -> Result<Vec<InspectionRecord>, RecordError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let record: InspectionRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        records.push(record);
    }

    log::debug!("Decoded {} records from CSV", records.len());
    Ok(records)
}
