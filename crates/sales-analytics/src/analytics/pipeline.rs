use super::rates::TREND_WINDOW_DAYS;
use super::records::LeadRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Minimum interest level counted as a qualified lead.
pub const QUALIFIED_INTEREST: i32 = 3;
/// Minimum interest level counted as a hot prospect.
pub const HOT_INTEREST: i32 = 4;
/// Share of open leads without a package presentation above which presentation is the bottleneck.
const PACKAGE_GAP_THRESHOLD: f64 = 0.3;

/// Coarse two-way heuristic for where open leads stall. Not a learned model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckStage {
    PackagePresentation,
    #[default]
    FinalDecision,
}

impl BottleneckStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PackagePresentation => "Package Presentation",
            Self::FinalDecision => "Final Decision",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineHealthMetrics {
    pub total_pipeline: usize,
    pub qualified_leads: usize,
    pub hot_prospects: usize,
    pub bottleneck_stage: BottleneckStage,
    pub bottleneck_label: String,
    pub predicted_conversions: u64,
    pub pipeline_velocity: f64,
}

pub fn analyze_pipeline(records: &[LeadRecord], now: DateTime<Utc>) -> PipelineHealthMetrics {
    let pipeline: Vec<&LeadRecord> = records.iter().filter(|record| !record.signed_up).collect();
    let qualified_leads = pipeline
        .iter()
        .filter(|record| record.interest_level >= QUALIFIED_INTEREST)
        .count();
    let hot_prospects = pipeline
        .iter()
        .filter(|record| record.interest_level >= HOT_INTEREST)
        .count();
    let without_package = pipeline.iter().filter(|record| !record.package_seen).count();

    let bottleneck_stage = classify_bottleneck(without_package, pipeline.len());

    let converted = records.len() - pipeline.len();
    let historical_rate = if records.is_empty() {
        0.0
    } else {
        converted as f64 / records.len() as f64
    };
    let predicted_conversions = (qualified_leads as f64 * historical_rate).round() as u64;

    let window_start = now - Duration::days(TREND_WINDOW_DAYS);
    let recent = records
        .iter()
        .filter(|record| record.timestamp >= window_start)
        .count();

    PipelineHealthMetrics {
        total_pipeline: pipeline.len(),
        qualified_leads,
        hot_prospects,
        bottleneck_stage,
        bottleneck_label: bottleneck_stage.label().to_string(),
        predicted_conversions,
        pipeline_velocity: recent as f64 / TREND_WINDOW_DAYS as f64,
    }
}

fn classify_bottleneck(without_package: usize, pipeline: usize) -> BottleneckStage {
    if pipeline > 0 && without_package as f64 / pipeline as f64 > PACKAGE_GAP_THRESHOLD {
        BottleneckStage::PackagePresentation
    } else {
        BottleneckStage::FinalDecision
    }
}
