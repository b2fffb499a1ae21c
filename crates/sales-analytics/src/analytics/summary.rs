use super::benchmark::{analyze_benchmarks, PerformanceBenchmarks};
use super::market::{analyze_market, MarketIntelligence, DEFAULT_TOTAL_ADDRESSABLE_MARKET};
use super::pipeline::{analyze_pipeline, BottleneckStage, PipelineHealthMetrics};
use super::predictive::{predict, PredictiveInputs, PredictiveInsights};
use super::rates::percentage;
use super::records::LeadRecord;
use super::rep_stats::{calculate_rep_stats, signup_leaderboard, RepStats};
use super::velocity::{analyze_velocity, SalesVelocityMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONVERSION_ALERT_PCT: f64 = 15.0;
const PIPELINE_ALERT_SIZE: usize = 20;
const TREND_ALERT_PCT: f64 = -5.0;

/// Tunables for a full analytics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsSettings {
    pub total_addressable_market: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            total_addressable_market: DEFAULT_TOTAL_ADDRESSABLE_MARKET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryAlert {
    pub severity: AlertSeverity,
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub total_leads: usize,
    pub total_conversions: usize,
    pub conversion_rate: f64,
    pub open_pipeline: usize,
    pub hot_prospects: usize,
    pub velocity_trend: f64,
    pub forecast_next_30_days: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub key_metrics: KeyMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<SummaryAlert>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub sales_velocity: SalesVelocityMetrics,
    pub pipeline_health: PipelineHealthMetrics,
    pub performance_benchmarks: PerformanceBenchmarks,
    pub market_intelligence: MarketIntelligence,
    pub predictive_insights: PredictiveInsights,
    pub executive_summary: ExecutiveSummary,
}

/// Runs every analyzer over one snapshot of records.
///
/// Holds no state between calls; the same records and `now` always produce the same result.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {
    settings: AnalyticsSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: AnalyticsSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> AnalyticsSettings {
        self.settings
    }

    pub fn rep_stats(&self, records: &[LeadRecord]) -> Vec<RepStats> {
        calculate_rep_stats(records)
    }

    pub fn leaderboard(&self, records: &[LeadRecord]) -> Vec<RepStats> {
        signup_leaderboard(&calculate_rep_stats(records))
    }

    pub fn analyze(&self, records: &[LeadRecord], now: DateTime<Utc>) -> AnalyticsResult {
        debug!(records = records.len(), %now, "computing sales analytics");

        let sales_velocity = analyze_velocity(records, now);
        let pipeline_health = analyze_pipeline(records, now);
        let performance_benchmarks = analyze_benchmarks(records);
        let market_intelligence =
            analyze_market(records, now, self.settings.total_addressable_market);

        let conversions = records.iter().filter(|record| record.signed_up).count();
        let conversion_rate = percentage(conversions, records.len());
        let predictive_insights = predict(
            records,
            PredictiveInputs {
                growth_rate: market_intelligence.opportunity.projected_growth,
                conversion_rate,
                open_pipeline: pipeline_health.total_pipeline,
            },
        );

        let executive_summary = summarize(
            KeyMetrics {
                total_leads: records.len(),
                total_conversions: conversions,
                conversion_rate,
                open_pipeline: pipeline_health.total_pipeline,
                hot_prospects: pipeline_health.hot_prospects,
                velocity_trend: sales_velocity.velocity_trend,
                forecast_next_30_days: predictive_insights.forecast.next_30_days,
            },
            &pipeline_health,
            &market_intelligence,
            &predictive_insights,
        );

        AnalyticsResult {
            generated_at: now,
            record_count: records.len(),
            sales_velocity,
            pipeline_health,
            performance_benchmarks,
            market_intelligence,
            predictive_insights,
            executive_summary,
        }
    }
}

fn summarize(
    key_metrics: KeyMetrics,
    pipeline: &PipelineHealthMetrics,
    market: &MarketIntelligence,
    predictive: &PredictiveInsights,
) -> ExecutiveSummary {
    let mut alerts = Vec::new();

    if key_metrics.total_leads > 0 && key_metrics.conversion_rate < CONVERSION_ALERT_PCT {
        alerts.push(SummaryAlert {
            severity: AlertSeverity::Critical,
            message: format!(
                "Conversion rate {:.1}% is below the {CONVERSION_ALERT_PCT:.0}% benchmark",
                key_metrics.conversion_rate
            ),
        });
    }

    if key_metrics.open_pipeline < PIPELINE_ALERT_SIZE {
        alerts.push(SummaryAlert {
            severity: AlertSeverity::Warning,
            message: format!(
                "Only {} open lead{} in the pipeline",
                key_metrics.open_pipeline,
                if key_metrics.open_pipeline == 1 { "" } else { "s" }
            ),
        });
    }

    if key_metrics.velocity_trend < TREND_ALERT_PCT {
        alerts.push(SummaryAlert {
            severity: AlertSeverity::Warning,
            message: format!(
                "Conversions down {:.0}% against the prior 30 days",
                key_metrics.velocity_trend.abs()
            ),
        });
    }

    if pipeline.bottleneck_stage == BottleneckStage::PackagePresentation {
        alerts.push(SummaryAlert {
            severity: AlertSeverity::Warning,
            message: "Most open leads have not seen the package presentation".to_string(),
        });
    }

    if market.unclassified_records > 0 {
        alerts.push(SummaryAlert {
            severity: AlertSeverity::Info,
            message: format!(
                "{} lead(s) did not match any market segment rule",
                market.unclassified_records
            ),
        });
    }

    let mut recommendations: Vec<_> = predictive.recommendations.iter().collect();
    recommendations.sort_by_key(|recommendation| recommendation.priority);
    let mut next_actions: Vec<String> = recommendations
        .into_iter()
        .map(|recommendation| recommendation.action.clone())
        .collect();

    if key_metrics.hot_prospects > 0 {
        next_actions.push(format!(
            "Follow up with {} hot prospect{} this week",
            key_metrics.hot_prospects,
            if key_metrics.hot_prospects == 1 { "" } else { "s" }
        ));
    }

    if next_actions.is_empty() {
        next_actions.push("No blockers detected; maintain current sales cadence".to_string());
    }

    ExecutiveSummary {
        key_metrics,
        alerts,
        next_actions,
    }
}
