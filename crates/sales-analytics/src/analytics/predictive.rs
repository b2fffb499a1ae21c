use super::rates::daily_submission_rate;
use super::records::LeadRecord;
use serde::{Deserialize, Serialize};

const TREND_THRESHOLD_PCT: f64 = 5.0;
const LOW_CONVERSION_PCT: f64 = 15.0;
const MIN_HEALTHY_PIPELINE: usize = 20;
const LARGE_SAMPLE: usize = 50;

/// Figures computed by the other analyzers that feed the forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictiveInputs {
    /// Percent change in conversions, trailing window against the prior one.
    pub growth_rate: f64,
    /// Overall conversion rate as a percentage.
    pub conversion_rate: f64,
    pub open_pipeline: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionForecast {
    pub next_7_days: u64,
    pub next_30_days: u64,
    pub next_90_days: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

impl TrendDirection {
    pub fn from_growth(growth_rate: f64) -> Self {
        if growth_rate > TREND_THRESHOLD_PCT {
            Self::Up
        } else if growth_rate < -TREND_THRESHOLD_PCT {
            Self::Down
        } else {
            Self::Stable
        }
    }
}

/// Direction and strength of the conversion trend.
///
/// `confidence` is a sample-size heuristic (85 once more than fifty records exist,
/// otherwise 1.5 per record), not a statistical interval.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub strength: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ConversionOptimization,
    LeadGeneration,
    PerformanceRecovery,
}

impl RecommendationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ConversionOptimization => "Conversion Optimization",
            Self::LeadGeneration => "Lead Generation",
            Self::PerformanceRecovery => "Performance Recovery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub priority: Priority,
    pub insight: String,
    pub action: String,
    pub expected_impact: String,
}

impl Recommendation {
    fn new(
        kind: RecommendationKind,
        priority: Priority,
        insight: &str,
        action: &str,
        expected_impact: &str,
    ) -> Self {
        Self {
            kind,
            title: kind.label().to_string(),
            priority,
            insight: insight.to_string(),
            action: action.to_string(),
            expected_impact: expected_impact.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveInsights {
    pub forecast: ConversionForecast,
    pub trend: TrendAnalysis,
    pub recommendations: Vec<Recommendation>,
}

pub fn predict(records: &[LeadRecord], inputs: PredictiveInputs) -> PredictiveInsights {
    let daily_rate = daily_submission_rate(records);
    let conversion_fraction = inputs.conversion_rate / 100.0;
    let project = |days: f64| (daily_rate * days * conversion_fraction).round() as u64;

    let trend = analyze_trend(inputs.growth_rate, records.len());

    PredictiveInsights {
        forecast: ConversionForecast {
            next_7_days: project(7.0),
            next_30_days: project(30.0),
            next_90_days: project(90.0),
        },
        trend,
        recommendations: recommend(&inputs, trend.direction),
    }
}

fn analyze_trend(growth_rate: f64, record_count: usize) -> TrendAnalysis {
    let confidence = if record_count > LARGE_SAMPLE {
        85.0
    } else {
        record_count as f64 * 1.5
    };

    TrendAnalysis {
        direction: TrendDirection::from_growth(growth_rate),
        strength: (growth_rate.abs() * 2.0).min(100.0),
        confidence: confidence.min(100.0),
    }
}

fn recommend(inputs: &PredictiveInputs, direction: TrendDirection) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if inputs.conversion_rate < LOW_CONVERSION_PCT {
        recommendations.push(Recommendation::new(
            RecommendationKind::ConversionOptimization,
            Priority::High,
            "Conversion rate is below the 15% benchmark",
            "Review package presentation and follow-up cadence for qualified leads",
            "Lifting conversion by five points adds roughly a third more customers",
        ));
    }

    if inputs.open_pipeline < MIN_HEALTHY_PIPELINE {
        recommendations.push(Recommendation::new(
            RecommendationKind::LeadGeneration,
            Priority::High,
            "Open pipeline is too thin to sustain the current close rate",
            "Increase prospecting activity and revisit dormant territories",
            "A pipeline of twenty or more open leads stabilizes monthly conversions",
        ));
    }

    if direction == TrendDirection::Down {
        recommendations.push(Recommendation::new(
            RecommendationKind::PerformanceRecovery,
            Priority::Medium,
            "Conversions are trending down against the prior thirty days",
            "Pair lower performers with top reps and audit recent lost deals",
            "Returning to the prior window's pace recovers the lost conversions",
        ));
    }

    recommendations
}
