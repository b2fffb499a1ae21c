use super::catalog::{Territory, TerritoryCatalog};
use crate::analytics::benchmark::analyze_benchmarks;
use crate::analytics::pipeline::analyze_pipeline;
use crate::analytics::rates::{daily_submission_rate, percentage, ratio, MetricValue};
use crate::analytics::records::LeadRecord;
use crate::analytics::velocity::analyze_velocity;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_TREND_DAYS: u32 = 30;
/// Longest trend series `trend_series` will build; larger requests are truncated.
pub const MAX_TREND_DAYS: u32 = 3_660;

const AVG_DEAL_SIZE: f64 = 2_500.0;
const DEAL_SIZE_BASIS: &str = "fixed placeholder pending deal value tracking";

/// Metrics shared by territory and country rollups, computed over the scoped records only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedMetrics {
    pub total_leads: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
    pub avg_interest_level: f64,
    pub package_seen_rate: f64,
    pub open_pipeline: usize,
    pub qualified_leads: usize,
    pub hot_prospects: usize,
    pub avg_time_to_conversion: f64,
    pub velocity_trend: f64,
    pub daily_submissions: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_rep: Option<String>,
    pub avg_deal_size: MetricValue,
    /// Same approximation as `avg_time_to_conversion`: age of converted records at `now`.
    pub time_to_close: f64,
}

impl ScopedMetrics {
    pub fn compute(records: &[LeadRecord], now: DateTime<Utc>) -> Self {
        let conversions = records.iter().filter(|record| record.signed_up).count();
        let package_seen = records.iter().filter(|record| record.package_seen).count();
        let interest_sum: i64 = records
            .iter()
            .map(|record| i64::from(record.interest_level))
            .sum();

        let pipeline = analyze_pipeline(records, now);
        let velocity = analyze_velocity(records, now);
        let top_rep = analyze_benchmarks(records)
            .top_performer
            .map(|performer| performer.username);

        Self {
            total_leads: records.len(),
            conversions,
            conversion_rate: percentage(conversions, records.len()),
            avg_interest_level: ratio(interest_sum as f64, records.len()),
            package_seen_rate: percentage(package_seen, records.len()),
            open_pipeline: pipeline.total_pipeline,
            qualified_leads: pipeline.qualified_leads,
            hot_prospects: pipeline.hot_prospects,
            avg_time_to_conversion: velocity.avg_time_to_conversion,
            velocity_trend: velocity.velocity_trend,
            daily_submissions: daily_submission_rate(records),
            top_rep,
            avg_deal_size: MetricValue::estimated(AVG_DEAL_SIZE, DEAL_SIZE_BASIS),
            time_to_close: velocity.avg_time_to_conversion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryMetrics {
    pub territory_id: String,
    pub territory_name: String,
    pub country_id: String,
    #[serde(flatten)]
    pub metrics: ScopedMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetrics {
    pub country_id: String,
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub territory_ids: Vec<String>,
    #[serde(flatten)]
    pub metrics: ScopedMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub leads: usize,
    pub conversions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepTerritoryEntry {
    pub territory_id: String,
    pub territory_name: String,
    pub leads: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepTerritoryPerformance {
    pub username: String,
    pub territories: Vec<RepTerritoryEntry>,
    pub total_leads: usize,
    pub total_conversions: usize,
    pub overall_conversion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonMetric {
    Leads,
    Conversions,
    #[serde(alias = "conversion_rate")]
    ConversionRate,
    #[serde(alias = "avg_deal_size")]
    AvgDealSize,
    #[serde(alias = "time_to_close")]
    TimeToClose,
}

impl ComparisonMetric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Conversions => "conversions",
            Self::ConversionRate => "conversionRate",
            Self::AvgDealSize => "avgDealSize",
            Self::TimeToClose => "timeToClose",
        }
    }

    fn value(self, metrics: &ScopedMetrics) -> f64 {
        match self {
            Self::Leads => metrics.total_leads as f64,
            Self::Conversions => metrics.conversions as f64,
            Self::ConversionRate => metrics.conversion_rate,
            Self::AvgDealSize => metrics.avg_deal_size.value(),
            Self::TimeToClose => metrics.time_to_close,
        }
    }

    /// Best first. Lower time to close ranks first, and a territory without conversions has no
    /// time to close, so it ranks after every territory that has one. Every other metric ranks
    /// highest first.
    fn rank(self, a: &ScopedMetrics, b: &ScopedMetrics) -> Ordering {
        match self {
            Self::TimeToClose => (a.conversions == 0)
                .cmp(&(b.conversions == 0))
                .then_with(|| a.time_to_close.total_cmp(&b.time_to_close)),
            _ => self.value(b).total_cmp(&self.value(a)),
        }
    }
}

impl fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown comparison metric '{0}'; expected leads, conversions, conversionRate, avgDealSize, or timeToClose")]
pub struct UnknownComparisonMetric(pub String);

impl FromStr for ComparisonMetric {
    type Err = UnknownComparisonMetric;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "leads" => Ok(Self::Leads),
            "conversions" => Ok(Self::Conversions),
            "conversionRate" | "conversion_rate" => Ok(Self::ConversionRate),
            "avgDealSize" | "avg_deal_size" => Ok(Self::AvgDealSize),
            "timeToClose" | "time_to_close" => Ok(Self::TimeToClose),
            other => Err(UnknownComparisonMetric(other.to_string())),
        }
    }
}

/// Territory and country scoped rollups over a record snapshot.
///
/// Records without a territory never appear in any rollup.
pub struct TerritoryRollupService<C> {
    catalog: C,
}

impl<C: TerritoryCatalog> TerritoryRollupService<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn territory_metrics(
        &self,
        records: &[LeadRecord],
        territory_id: &str,
        now: DateTime<Utc>,
    ) -> Option<TerritoryMetrics> {
        let territory = self.catalog.territory(territory_id)?;
        Some(Self::metrics_for(&territory, records, now))
    }

    pub fn country_metrics(
        &self,
        records: &[LeadRecord],
        country_id: &str,
        now: DateTime<Utc>,
    ) -> Option<CountryMetrics> {
        let country = self.catalog.country(country_id)?;
        let territory_ids: Vec<String> = self
            .catalog
            .territories_in_country(country_id)
            .into_iter()
            .map(|territory| territory.id)
            .collect();

        let members: HashSet<&str> = territory_ids.iter().map(String::as_str).collect();
        let scoped: Vec<LeadRecord> = records
            .iter()
            .filter(|record| {
                record
                    .territory
                    .as_deref()
                    .is_some_and(|territory| members.contains(territory))
            })
            .cloned()
            .collect();
        debug!(country_id, records = scoped.len(), "computing country rollup");

        Some(CountryMetrics {
            country_id: country.id,
            country_name: country.name,
            country_code: country.code,
            territory_ids,
            metrics: ScopedMetrics::compute(&scoped, now),
        })
    }

    /// Per-day lead and conversion counts for the trailing `days` calendar days (UTC),
    /// oldest first and ending on the day of `now`.
    ///
    /// `days` is capped at [`MAX_TREND_DAYS`]; days before the earliest representable date are
    /// left out. Zero days yields an empty series.
    pub fn trend_series(
        &self,
        records: &[LeadRecord],
        territory_id: &str,
        now: DateTime<Utc>,
        days: u32,
    ) -> Option<Vec<DailyTrendPoint>> {
        self.catalog.territory(territory_id)?;

        let mut per_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
        for record in records
            .iter()
            .filter(|record| record.in_territory(territory_id))
        {
            let (leads, conversions) = per_day.entry(record.timestamp.date_naive()).or_default();
            *leads += 1;
            *conversions += usize::from(record.signed_up);
        }

        let today = now.date_naive();
        let mut series: Vec<DailyTrendPoint> = (0..u64::from(days.min(MAX_TREND_DAYS)))
            .map_while(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|date| {
                let (leads, conversions) = per_day.get(&date).copied().unwrap_or_default();
                DailyTrendPoint {
                    date,
                    leads,
                    conversions,
                }
            })
            .collect();
        series.reverse();

        Some(series)
    }

    /// A rep's results in each territory the catalog assigns to them.
    pub fn rep_performance(
        &self,
        records: &[LeadRecord],
        username: &str,
    ) -> Option<RepTerritoryPerformance> {
        let territories = self.catalog.territories_for_rep(username);
        if territories.is_empty() {
            return None;
        }

        let entries: Vec<RepTerritoryEntry> = territories
            .into_iter()
            .map(|territory| {
                let (leads, conversions) = records
                    .iter()
                    .filter(|record| {
                        record.username.as_deref() == Some(username)
                            && record.in_territory(&territory.id)
                    })
                    .fold((0, 0), |(leads, conversions), record| {
                        (leads + 1, conversions + usize::from(record.signed_up))
                    });
                RepTerritoryEntry {
                    territory_id: territory.id,
                    territory_name: territory.name,
                    leads,
                    conversions,
                    conversion_rate: percentage(conversions, leads),
                }
            })
            .collect();

        let total_leads = entries.iter().map(|entry| entry.leads).sum();
        let total_conversions = entries.iter().map(|entry| entry.conversions).sum();

        Some(RepTerritoryPerformance {
            username: username.to_string(),
            territories: entries,
            total_leads,
            total_conversions,
            overall_conversion_rate: percentage(total_conversions, total_leads),
        })
    }

    /// Metrics for the known territories among `territory_ids`, best first by `metric`.
    /// Unknown ids are skipped and repeated ids are ranked once.
    pub fn compare_territories<S: AsRef<str>>(
        &self,
        records: &[LeadRecord],
        territory_ids: &[S],
        metric: ComparisonMetric,
        now: DateTime<Utc>,
    ) -> Vec<TerritoryMetrics> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut compared: Vec<TerritoryMetrics> = territory_ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|territory_id| seen.insert(*territory_id))
            .filter_map(|territory_id| self.territory_metrics(records, territory_id, now))
            .collect();

        compared.sort_by(|a, b| metric.rank(&a.metrics, &b.metrics));
        compared
    }

    fn metrics_for(
        territory: &Territory,
        records: &[LeadRecord],
        now: DateTime<Utc>,
    ) -> TerritoryMetrics {
        let scoped: Vec<LeadRecord> = records
            .iter()
            .filter(|record| record.in_territory(&territory.id))
            .cloned()
            .collect();
        debug!(
            territory_id = %territory.id,
            records = scoped.len(),
            "computing territory rollup"
        );

        TerritoryMetrics {
            territory_id: territory.id.clone(),
            territory_name: territory.name.clone(),
            country_id: territory.country_id.clone(),
            metrics: ScopedMetrics::compute(&scoped, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::records::fixtures::*;
    use crate::territory::catalog::{Country, InMemoryTerritoryCatalog};

    fn catalog() -> InMemoryTerritoryCatalog {
        InMemoryTerritoryCatalog::new(
            vec![Country {
                id: "us".to_string(),
                name: "United States".to_string(),
                code: Some("US".to_string()),
            }],
            vec![
                Territory {
                    id: "north".to_string(),
                    name: "North".to_string(),
                    country_id: "us".to_string(),
                    assigned_reps: vec!["alice".to_string()],
                },
                Territory {
                    id: "south".to_string(),
                    name: "South".to_string(),
                    country_id: "us".to_string(),
                    assigned_reps: vec!["alice".to_string(), "bob".to_string()],
                },
            ],
        )
    }

    fn placed(mut record: LeadRecord, territory: &str) -> LeadRecord {
        record.territory = Some(territory.to_string());
        record
    }

    #[test]
    fn territory_scope_excludes_records_without_territory() {
        let records = vec![
            placed(lead(1, 4, true), "north"),
            placed(lead(2, 2, false), "north"),
            lead(3, 5, true),
        ];
        let service = TerritoryRollupService::new(catalog());

        let metrics = service
            .territory_metrics(&records, "north", reference_now())
            .expect("north exists");
        assert_eq!(metrics.metrics.total_leads, 2);
        assert_eq!(metrics.metrics.conversion_rate, 50.0);
        assert_eq!(metrics.metrics.avg_interest_level, 3.0);

        let country = service
            .country_metrics(&records, "us", reference_now())
            .expect("us exists");
        assert_eq!(country.metrics.total_leads, 2);
        assert_eq!(country.territory_ids, vec!["north", "south"]);
    }

    #[test]
    fn unknown_identifiers_are_not_found() {
        let service = TerritoryRollupService::new(catalog());
        assert!(service.territory_metrics(&[], "west", reference_now()).is_none());
        assert!(service.country_metrics(&[], "ca", reference_now()).is_none());
        assert!(service
            .trend_series(&[], "west", reference_now(), DEFAULT_TREND_DAYS)
            .is_none());
        assert!(service.rep_performance(&[], "mallory").is_none());
    }

    #[test]
    fn trend_series_is_oldest_first_per_calendar_day() {
        let records = vec![
            placed(days_ago(lead(1, 3, true), 0), "north"),
            placed(days_ago(lead(2, 3, false), 0), "north"),
            placed(days_ago(lead(3, 3, false), 2), "north"),
            placed(days_ago(lead(4, 3, true), 2), "south"),
        ];
        let service = TerritoryRollupService::new(catalog());

        let series = service
            .trend_series(&records, "north", reference_now(), 3)
            .expect("north exists");
        let today = reference_now().date_naive();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, today - chrono::Duration::days(2));
        assert_eq!((series[0].leads, series[0].conversions), (1, 0));
        assert_eq!((series[1].leads, series[1].conversions), (0, 0));
        assert_eq!(series[2].date, today);
        assert_eq!((series[2].leads, series[2].conversions), (2, 1));
    }

    #[test]
    fn oversized_trend_window_is_truncated() {
        let records = vec![placed(days_ago(lead(1, 3, true), 1), "north")];
        let service = TerritoryRollupService::new(catalog());

        let series = service
            .trend_series(&records, "north", reference_now(), 200_000_000)
            .expect("north exists");
        assert_eq!(series.len(), MAX_TREND_DAYS as usize);
        assert_eq!(series.last().map(|point| point.date), Some(reference_now().date_naive()));
        assert_eq!(series.iter().map(|point| point.leads).sum::<usize>(), 1);
    }

    #[test]
    fn trend_window_stops_at_earliest_representable_date() {
        let start = NaiveDate::MIN
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_utc();
        let now = start + chrono::Duration::days(2);
        let service = TerritoryRollupService::new(catalog());

        let series = service
            .trend_series(&[], "north", now, 10)
            .expect("north exists");
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, NaiveDate::MIN);
    }

    #[test]
    fn zero_day_trend_is_empty() {
        let service = TerritoryRollupService::new(catalog());
        let series = service
            .trend_series(&[], "north", reference_now(), 0)
            .expect("north exists");
        assert!(series.is_empty());
    }

    #[test]
    fn rep_performance_is_restricted_to_rep_and_territory() {
        let records = vec![
            owned_by(placed(lead(1, 3, true), "north"), "alice"),
            owned_by(placed(lead(2, 3, false), "south"), "alice"),
            owned_by(placed(lead(3, 3, true), "south"), "alice"),
            owned_by(placed(lead(4, 3, true), "south"), "bob"),
            owned_by(lead(5, 3, true), "alice"),
        ];
        let service = TerritoryRollupService::new(catalog());

        let performance = service
            .rep_performance(&records, "alice")
            .expect("alice is assigned");
        assert_eq!(performance.territories.len(), 2);
        assert_eq!(performance.territories[0].leads, 1);
        assert_eq!(performance.territories[1].leads, 2);
        assert_eq!(performance.territories[1].conversion_rate, 50.0);
        assert_eq!(performance.total_leads, 3);
        assert_eq!(performance.total_conversions, 2);
    }

    #[test]
    fn comparison_sorts_descending_except_time_to_close() {
        let records = vec![
            placed(days_ago(lead(1, 3, true), 20), "north"),
            placed(days_ago(lead(2, 3, true), 2), "south"),
            placed(days_ago(lead(3, 3, false), 2), "south"),
        ];
        let service = TerritoryRollupService::new(catalog());
        let ids = ["north", "south", "west"];

        let by_leads =
            service.compare_territories(&records, &ids, ComparisonMetric::Leads, reference_now());
        assert_eq!(by_leads.len(), 2);
        assert_eq!(by_leads[0].territory_id, "south");

        let by_close = service.compare_territories(
            &records,
            &ids,
            ComparisonMetric::TimeToClose,
            reference_now(),
        );
        assert_eq!(by_close[0].territory_id, "south");
        assert!(by_close[0].metrics.time_to_close < by_close[1].metrics.time_to_close);

        let by_rate = service.compare_territories(
            &records,
            &ids,
            ComparisonMetric::ConversionRate,
            reference_now(),
        );
        assert_eq!(by_rate[0].territory_id, "north");
    }

    #[test]
    fn territories_without_conversions_close_last() {
        let records = vec![
            placed(days_ago(lead(1, 3, true), 20), "north"),
            placed(days_ago(lead(2, 3, false), 2), "south"),
        ];
        let service = TerritoryRollupService::new(catalog());

        let by_close = service.compare_territories(
            &records,
            ["south", "north"].as_slice(),
            ComparisonMetric::TimeToClose,
            reference_now(),
        );
        let ids: Vec<&str> = by_close
            .iter()
            .map(|entry| entry.territory_id.as_str())
            .collect();
        assert_eq!(ids, vec!["north", "south"]);
    }

    #[test]
    fn repeated_ids_are_compared_once() {
        let service = TerritoryRollupService::new(catalog());
        let ranked = service.compare_territories(
            &[],
            ["north", "south", "north"].as_slice(),
            ComparisonMetric::Leads,
            reference_now(),
        );
        let ids: Vec<&str> = ranked
            .iter()
            .map(|entry| entry.territory_id.as_str())
            .collect();
        assert_eq!(ids, vec!["north", "south"]);
    }

    #[test]
    fn metric_json_accepts_snake_case_spellings() {
        for (raw, expected) in [
            ("\"timeToClose\"", ComparisonMetric::TimeToClose),
            ("\"time_to_close\"", ComparisonMetric::TimeToClose),
            ("\"conversion_rate\"", ComparisonMetric::ConversionRate),
            ("\"avg_deal_size\"", ComparisonMetric::AvgDealSize),
        ] {
            let metric: ComparisonMetric = serde_json::from_str(raw).expect("metric parses");
            assert_eq!(metric, expected);
        }
        assert_eq!(
            serde_json::to_string(&ComparisonMetric::TimeToClose).expect("serializes"),
            "\"timeToClose\""
        );
    }

    #[test]
    fn comparison_metric_parses_wire_names() {
        assert_eq!(
            "timeToClose".parse::<ComparisonMetric>(),
            Ok(ComparisonMetric::TimeToClose)
        );
        assert_eq!(
            "conversion_rate".parse::<ComparisonMetric>(),
            Ok(ComparisonMetric::ConversionRate)
        );
        assert!("revenue".parse::<ComparisonMetric>().is_err());
        assert_eq!(ComparisonMetric::AvgDealSize.to_string(), "avgDealSize");
    }
}
