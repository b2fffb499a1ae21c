use super::normalizer::{normalize_text, parse_flag};
use super::LeadImportError;
use crate::analytics::records::{LeadId, LeadRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<LeadRecord>, LeadImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while csv_reader.read_record(&mut raw)? {
        // line where the row starts; quoted fields may span several lines
        let line = raw
            .position()
            .map_or(0, |position| position.line() as usize);
        let record = raw
            .deserialize::<LeadRow>(Some(&headers))?
            .into_record()
            .map_err(|reason| LeadImportError::InvalidRow { line, reason })?;
        records.push(record);
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct LeadRow {
    id: String,
    owner_name: String,
    interest_level: String,
    signed_up: String,
    package_seen: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    decision_makers: Option<String>,
    timestamp: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    username: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    territory: Option<String>,
}

impl LeadRow {
    fn into_record(self) -> Result<LeadRecord, String> {
        let raw_id = self.id.trim();
        if raw_id.is_empty() {
            return Err("id is empty".to_string());
        }
        // only canonical decimals become numeric so ids like "007" keep their spelling
        let id = match raw_id.parse::<i64>() {
            Ok(numeric) if numeric.to_string() == raw_id => LeadId::Numeric(numeric),
            _ => LeadId::Opaque(raw_id.to_string()),
        };

        let interest_level = self
            .interest_level
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("interest_level '{}' is not an integer", self.interest_level))?;

        let signed_up = parse_flag(&self.signed_up)
            .ok_or_else(|| format!("signed_up '{}' is not a boolean", self.signed_up))?;
        let package_seen = parse_flag(&self.package_seen)
            .ok_or_else(|| format!("package_seen '{}' is not a boolean", self.package_seen))?;

        let timestamp = parse_timestamp(&self.timestamp)
            .ok_or_else(|| format!("timestamp '{}' is not RFC 3339 or YYYY-MM-DD", self.timestamp))?;

        Ok(LeadRecord {
            id,
            owner_name: normalize_text(&self.owner_name).unwrap_or_default(),
            interest_level,
            signed_up,
            package_seen,
            decision_makers: self.decision_makers.as_deref().and_then(normalize_text),
            timestamp,
            username: self.username.as_deref().and_then(normalize_text),
            territory: self.territory.as_deref().and_then(normalize_text),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Parses an RFC 3339 instant or a `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}
