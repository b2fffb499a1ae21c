use super::records::LeadRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the rolling comparison window, in days.
pub const TREND_WINDOW_DAYS: i64 = 30;

/// `part / whole * 100`, or `0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `numerator / denominator`, or `0` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Percent change from `previous` to `recent`; `0` when there is no prior activity.
pub fn growth_rate(recent: usize, previous: usize) -> f64 {
    if previous == 0 {
        0.0
    } else {
        (recent as f64 - previous as f64) / previous as f64 * 100.0
    }
}

/// Span covered by the records, `ceil((max - min) / 1 day)`, floored at one day.
pub fn date_range_days<'a, I>(records: I) -> i64
where
    I: IntoIterator<Item = &'a LeadRecord>,
{
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for record in records {
        bounds = Some(match bounds {
            None => (record.timestamp, record.timestamp),
            Some((min, max)) => (min.min(record.timestamp), max.max(record.timestamp)),
        });
    }

    let Some((min, max)) = bounds else {
        return 1;
    };

    let seconds = (max - min).num_seconds();
    let day = Duration::days(1).num_seconds();
    let days = seconds / day + i64::from(seconds % day != 0);
    days.max(1)
}

/// Records per day across the span the records cover.
pub fn daily_submission_rate(records: &[LeadRecord]) -> f64 {
    records.len() as f64 / date_range_days(records) as f64
}

/// Converted records whose timestamp falls in `[now - from_days_ago, now - to_days_ago)`.
pub fn conversions_between<'a, I>(
    records: I,
    now: DateTime<Utc>,
    from_days_ago: i64,
    to_days_ago: i64,
) -> usize
where
    I: IntoIterator<Item = &'a LeadRecord>,
{
    let start = now - Duration::days(from_days_ago);
    let end = now - Duration::days(to_days_ago);
    records
        .into_iter()
        .filter(|record| record.signed_up && record.timestamp >= start && record.timestamp < end)
        .count()
}

/// Converted-record growth of the trailing window against the window before it.
pub fn conversion_trend<'a, I>(records: I, now: DateTime<Utc>) -> f64
where
    I: IntoIterator<Item = &'a LeadRecord> + Clone,
{
    let recent = conversions_between(records.clone(), now, TREND_WINDOW_DAYS, 0);
    let previous = conversions_between(records, now, TREND_WINDOW_DAYS * 2, TREND_WINDOW_DAYS);
    growth_rate(recent, previous)
}

/// A figure that is either aggregated from records or a fixed stand-in awaiting real tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    Measured { value: f64 },
    Estimated { value: f64, basis: String },
}

impl MetricValue {
    pub fn estimated(value: f64, basis: &str) -> Self {
        Self::Estimated {
            value,
            basis: basis.to_string(),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Measured { value } | Self::Estimated { value, .. } => *value,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }
}
