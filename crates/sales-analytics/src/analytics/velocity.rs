//! Time-to-conversion distribution and conversion trend.
//!
//! No separate conversion timestamp is modeled, so "days to conversion" is the age of a
//! converted record at `now`. That approximation drifts for long-running pipelines and is
//! kept until a real conversion date is available.

use super::rates::{conversion_trend, ratio};
use super::records::LeadRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Converted records bucketed by age in whole days.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTimeframes {
    #[serde(rename = "0-7")]
    pub first_week: usize,
    #[serde(rename = "8-30")]
    pub first_month: usize,
    #[serde(rename = "31-90")]
    pub first_quarter: usize,
    #[serde(rename = "90+")]
    pub beyond_quarter: usize,
}

impl ConversionTimeframes {
    fn record(&mut self, age_in_days: i64) {
        match age_in_days {
            i64::MIN..=7 => self.first_week += 1,
            8..=30 => self.first_month += 1,
            31..=90 => self.first_quarter += 1,
            _ => self.beyond_quarter += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.first_week + self.first_month + self.first_quarter + self.beyond_quarter
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesVelocityMetrics {
    pub avg_time_to_conversion: f64,
    pub velocity_trend: f64,
    pub conversions_by_timeframe: ConversionTimeframes,
}

pub fn analyze_velocity(records: &[LeadRecord], now: DateTime<Utc>) -> SalesVelocityMetrics {
    let mut timeframes = ConversionTimeframes::default();
    let mut converted = 0usize;
    let mut total_days = 0.0;

    for record in records.iter().filter(|record| record.signed_up) {
        converted += 1;
        total_days += record.fractional_age_in_days(now);
        timeframes.record(record.age_in_days(now));
    }

    SalesVelocityMetrics {
        avg_time_to_conversion: ratio(total_days, converted),
        velocity_trend: conversion_trend(records, now),
        conversions_by_timeframe: timeframes,
    }
}
