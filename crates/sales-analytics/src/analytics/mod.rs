//! Aggregation of lead records into sales performance metrics.
//!
//! Every analyzer is a pure function of the records and an explicit `now`; nothing here
//! reads the wall clock or keeps state between calls.

pub mod benchmark;
pub mod market;
pub mod pipeline;
pub mod predictive;
pub mod rates;
pub mod records;
pub mod rep_stats;
pub mod summary;
pub mod velocity;

pub use benchmark::{analyze_benchmarks, PerformanceBenchmarks, PerformanceDistribution};
pub use market::{analyze_market, classify_segment, MarketIntelligence, MarketSegment};
pub use pipeline::{analyze_pipeline, BottleneckStage, PipelineHealthMetrics};
pub use predictive::{predict, PredictiveInputs, PredictiveInsights, TrendDirection};
pub use rates::MetricValue;
pub use records::{LeadId, LeadRecord, UNKNOWN_REP};
pub use rep_stats::{calculate_rep_stats, signup_leaderboard, RepStats, RepTally};
pub use summary::{AnalyticsEngine, AnalyticsResult, AnalyticsSettings, ExecutiveSummary};
pub use velocity::{analyze_velocity, SalesVelocityMetrics};
