//! Market segmentation over the free-text decision-maker field.
//!
//! Classification walks [`SEGMENT_RULES`] top to bottom and stops at the first match,
//! so a record mentioning both "owner only" and "board" lands in Owner Only. A non-empty
//! field that matches no rule belongs to no segment; those records are reported through
//! `unclassified_records` rather than forced into a bucket.

use super::rates::{conversion_trend, percentage, ratio, MetricValue};
use super::records::LeadRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOTAL_ADDRESSABLE_MARKET: u64 = 10_000;

const AVG_SALES_CYCLE_DAYS: f64 = 21.0;
const MARKET_SHARE_PCT: f64 = 2.5;
const PLACEHOLDER_BASIS: &str = "fixed placeholder pending sales cycle and market share tracking";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSegment {
    OwnerOnly,
    MultipleDecisionMakers,
    Committee,
    Unknown,
}

impl MarketSegment {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::OwnerOnly,
            Self::MultipleDecisionMakers,
            Self::Committee,
            Self::Unknown,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OwnerOnly => "Owner Only",
            Self::MultipleDecisionMakers => "Multiple Decision Makers",
            Self::Committee => "Committee",
            Self::Unknown => "Unknown",
        }
    }
}

pub struct SegmentRule {
    pub segment: MarketSegment,
    pub matches: fn(&str) -> bool,
}

/// Evaluated in order against the lowercased, trimmed field.
pub const SEGMENT_RULES: [SegmentRule; 4] = [
    SegmentRule {
        segment: MarketSegment::OwnerOnly,
        matches: mentions_sole_owner,
    },
    SegmentRule {
        segment: MarketSegment::MultipleDecisionMakers,
        matches: mentions_partners,
    },
    SegmentRule {
        segment: MarketSegment::Committee,
        matches: mentions_committee,
    },
    SegmentRule {
        segment: MarketSegment::Unknown,
        matches: str::is_empty,
    },
];

fn mentions_sole_owner(text: &str) -> bool {
    text.contains("owner only") || text.contains("just me")
}

// "and" also hits names like "Sandra"; accepted as part of the heuristic.
fn mentions_partners(text: &str) -> bool {
    text.contains("partner") || text.contains("and")
}

fn mentions_committee(text: &str) -> bool {
    text.contains("committee") || text.contains("board")
}

pub fn classify_segment(decision_makers: Option<&str>) -> Option<MarketSegment> {
    let text = decision_makers.unwrap_or_default().trim().to_lowercase();
    SEGMENT_RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| rule.segment)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub segment: MarketSegment,
    pub label: String,
    pub count: usize,
    pub conversion_rate: f64,
    pub avg_interest_level: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySizing {
    pub total_addressable_market: u64,
    pub current_penetration: f64,
    pub projected_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitivePosition {
    pub win_rate: f64,
    pub avg_sales_cycle: MetricValue,
    pub market_share: MetricValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIntelligence {
    pub segments: Vec<SegmentMetrics>,
    pub unclassified_records: usize,
    pub opportunity: OpportunitySizing,
    pub competitive_position: CompetitivePosition,
}

pub fn analyze_market(
    records: &[LeadRecord],
    now: DateTime<Utc>,
    total_addressable_market: u64,
) -> MarketIntelligence {
    let classified: Vec<(Option<MarketSegment>, &LeadRecord)> = records
        .iter()
        .map(|record| (classify_segment(record.decision_makers.as_deref()), record))
        .collect();

    let segments = MarketSegment::ordered()
        .into_iter()
        .filter_map(|segment| {
            let members: Vec<&LeadRecord> = classified
                .iter()
                .filter(|(assigned, _)| *assigned == Some(segment))
                .map(|(_, record)| *record)
                .collect();
            segment_metrics(segment, &members, now)
        })
        .collect();

    let unclassified_records = classified
        .iter()
        .filter(|(assigned, _)| assigned.is_none())
        .count();
    let converted = records.iter().filter(|record| record.signed_up).count();

    let current_penetration = if total_addressable_market == 0 {
        0.0
    } else {
        records.len() as f64 / total_addressable_market as f64 * 100.0
    };

    MarketIntelligence {
        segments,
        unclassified_records,
        opportunity: OpportunitySizing {
            total_addressable_market,
            current_penetration,
            projected_growth: conversion_trend(records, now),
        },
        competitive_position: CompetitivePosition {
            win_rate: percentage(converted, records.len()),
            avg_sales_cycle: MetricValue::estimated(AVG_SALES_CYCLE_DAYS, PLACEHOLDER_BASIS),
            market_share: MetricValue::estimated(MARKET_SHARE_PCT, PLACEHOLDER_BASIS),
        },
    }
}

fn segment_metrics(
    segment: MarketSegment,
    members: &[&LeadRecord],
    now: DateTime<Utc>,
) -> Option<SegmentMetrics> {
    if members.is_empty() {
        return None;
    }

    let converted = members.iter().filter(|record| record.signed_up).count();
    let interest_sum: i64 = members
        .iter()
        .map(|record| i64::from(record.interest_level))
        .sum();

    Some(SegmentMetrics {
        segment,
        label: segment.label().to_string(),
        count: members.len(),
        conversion_rate: percentage(converted, members.len()),
        avg_interest_level: ratio(interest_sum as f64, members.len()),
        growth_rate: conversion_trend(members.iter().copied(), now),
    })
}
