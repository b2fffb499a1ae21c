use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use sales_analytics::analytics::{AnalyticsEngine, LeadRecord};
use sales_analytics::clock::Clock;
use sales_analytics::config::AnalyticsConfig;
use sales_analytics::error::AppError;
use sales_analytics::import::{parse_timestamp, LeadCsvImporter};
use sales_analytics::territory::InMemoryTerritoryCatalog;
use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) analytics: AnalyticsConfig,
}

impl AppState {
    /// The request's `now` when given, otherwise the service clock.
    pub(crate) fn resolve_now(&self, requested: Option<DateTime<Utc>>) -> DateTime<Utc> {
        requested.unwrap_or_else(|| self.clock.now())
    }

    pub(crate) fn engine(&self) -> AnalyticsEngine {
        AnalyticsEngine::new(self.analytics.settings())
    }
}

/// Lead records carried by a request: inline JSON records, a CSV export body, or both.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LeadSource {
    #[serde(default)]
    pub(crate) records: Option<Vec<LeadRecord>>,
    #[serde(default)]
    pub(crate) leads_csv: Option<String>,
}

impl LeadSource {
    /// Inline records first, followed by the CSV rows. Neither present yields an empty set.
    pub(crate) fn into_records(self) -> Result<Vec<LeadRecord>, AppError> {
        let mut records = self.records.unwrap_or_default();
        if let Some(csv) = self.leads_csv {
            let imported = LeadCsvImporter::from_reader(Cursor::new(csv.into_bytes()))?;
            records.extend(imported);
        }
        Ok(records)
    }
}

pub(crate) fn load_records(path: &Path) -> Result<Vec<LeadRecord>, AppError> {
    LeadCsvImporter::from_path(path).map_err(AppError::from)
}

pub(crate) fn load_catalog(path: &Path) -> Result<InMemoryTerritoryCatalog, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Requested trend length, or the configured default. Lengths above the configured maximum are
/// rejected.
pub(crate) fn resolve_trend_days(
    requested: Option<u32>,
    analytics: &AnalyticsConfig,
) -> Result<u32, AppError> {
    let days = requested.unwrap_or(analytics.trend_days);
    if days > analytics.max_trend_days {
        return Err(AppError::InvalidRequest(format!(
            "days must be at most {} (got {days})",
            analytics.max_trend_days
        )));
    }
    Ok(days)
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}

pub(crate) fn deserialize_optional_instant<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_instant(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_source_combines_inline_and_csv_records() {
        let source: LeadSource = serde_json::from_value(serde_json::json!({
            "records": [{
                "id": 1,
                "owner_name": "Corner Bakery",
                "interest_level": 4,
                "signed_up": true,
                "package_seen": true,
                "timestamp": "2025-06-28T10:00:00Z",
                "username": "rep1"
            }],
            "leads_csv": "id,owner_name,interest_level,signed_up,package_seen,decision_makers,timestamp,username,territory\n2,Harbor Dental,3,no,no,,2025-06-27,rep2,\n"
        }))
        .expect("source deserializes");

        let records = source.into_records().expect("records load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rep_key(), "rep1");
        assert_eq!(records[1].rep_key(), "rep2");
    }

    #[test]
    fn empty_source_is_an_empty_snapshot() {
        let records = LeadSource::default().into_records().expect("empty loads");
        assert!(records.is_empty());
    }

    #[test]
    fn trend_days_default_and_cap_come_from_config() {
        let analytics = AnalyticsConfig::default();
        assert_eq!(
            resolve_trend_days(None, &analytics).expect("default fits"),
            analytics.trend_days
        );
        assert_eq!(resolve_trend_days(Some(0), &analytics).expect("zero fits"), 0);
        assert!(matches!(
            resolve_trend_days(Some(200_000_000), &analytics),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn parse_instant_accepts_plain_dates() {
        let instant = parse_instant("2025-06-30").expect("date parses");
        assert_eq!(instant.to_rfc3339(), "2025-06-30T00:00:00+00:00");
        assert!(parse_instant("yesterday").is_err());
    }
}
