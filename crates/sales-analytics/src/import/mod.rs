//! CSV import of Lead Store exports.

mod normalizer;
mod parser;

use crate::analytics::records::LeadRecord;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub use parser::parse_timestamp;

/// Expected domain of `interest_level`; values outside it are imported as given.
pub const INTEREST_LEVEL_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

#[derive(Debug)]
pub enum LeadImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for LeadImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadImportError::Io(err) => write!(f, "failed to read lead export: {}", err),
            LeadImportError::Csv(err) => write!(f, "invalid lead CSV data: {}", err),
            LeadImportError::InvalidRow { line, reason } => {
                write!(f, "invalid lead on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for LeadImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeadImportError::Io(err) => Some(err),
            LeadImportError::Csv(err) => Some(err),
            LeadImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for LeadImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LeadImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads lead records from a CSV export with the columns
/// `id, owner_name, interest_level, signed_up, package_seen, decision_makers, timestamp,
/// username, territory`. Any malformed row aborts the whole import.
pub struct LeadCsvImporter;

impl LeadCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<LeadRecord>, LeadImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<LeadRecord>, LeadImportError> {
        let records = parser::parse_records(reader)?;

        for record in &records {
            if !INTEREST_LEVEL_RANGE.contains(&record.interest_level) {
                warn!(
                    lead_id = %record.id,
                    interest_level = record.interest_level,
                    "interest level outside 1-5; aggregating as given"
                );
            }
        }

        Ok(records)
    }
}
