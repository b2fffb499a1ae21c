use crate::infra::{load_catalog, load_records, parse_instant, resolve_trend_days};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use sales_analytics::analytics::{AnalyticsEngine, AnalyticsResult, LeadRecord, MetricValue};
use sales_analytics::clock::{Clock, SystemClock};
use sales_analytics::config::AnalyticsConfig;
use sales_analytics::error::AppError;
use sales_analytics::territory::{
    ComparisonMetric, CountryMetrics, DailyTrendPoint, InMemoryTerritoryCatalog,
    RepTerritoryPerformance, ScopedMetrics, TerritoryMetrics, TerritoryRollupService,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Lead Store CSV export to analyze
    #[arg(long)]
    pub(crate) leads_csv: PathBuf,
    /// Reference instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Emit the full result as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TerritorySourceArgs {
    /// Lead Store CSV export to analyze
    #[arg(long)]
    pub(crate) leads_csv: PathBuf,
    /// Territory catalog JSON (`{ "countries": [...], "territories": [...] }`)
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Reference instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Emit JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum TerritoryCommand {
    /// Metrics for a single territory
    Metrics {
        #[arg(long)]
        territory: String,
        #[command(flatten)]
        source: TerritorySourceArgs,
    },
    /// Metrics for every territory of a country combined
    Country {
        #[arg(long)]
        country: String,
        #[command(flatten)]
        source: TerritorySourceArgs,
    },
    /// Day-by-day leads and conversions for a territory
    Trend {
        #[arg(long)]
        territory: String,
        /// Number of trailing days (defaults to ANALYTICS_TREND_DAYS, at most ANALYTICS_MAX_TREND_DAYS)
        #[arg(long)]
        days: Option<u32>,
        #[command(flatten)]
        source: TerritorySourceArgs,
    },
    /// Rank territories by one metric
    Compare {
        /// Comma separated territory ids
        #[arg(long, value_delimiter = ',', required = true)]
        territories: Vec<String>,
        /// leads, conversions, conversionRate, avgDealSize or timeToClose
        #[arg(long, default_value = "conversionRate")]
        metric: ComparisonMetric,
        #[command(flatten)]
        source: TerritorySourceArgs,
    },
    /// A rep's results across their assigned territories
    Rep {
        #[arg(long)]
        username: String,
        #[command(flatten)]
        source: TerritorySourceArgs,
    },
}

pub(crate) fn run_report(args: ReportArgs, analytics: AnalyticsConfig) -> Result<(), AppError> {
    let ReportArgs {
        leads_csv,
        now,
        json,
    } = args;

    let now = now.unwrap_or_else(|| SystemClock.now());
    let records = load_records(&leads_csv)?;
    let result = AnalyticsEngine::new(analytics.settings()).analyze(&records, now);

    if json {
        print_json(&result)?;
    } else {
        render_analytics_report(&result);
    }
    Ok(())
}

pub(crate) fn run_territory(
    command: TerritoryCommand,
    analytics: AnalyticsConfig,
) -> Result<(), AppError> {
    match command {
        TerritoryCommand::Metrics { territory, source } => {
            let (service, records, now) = load_rollup_inputs(&source)?;
            let metrics = service
                .territory_metrics(&records, &territory, now)
                .ok_or_else(|| AppError::not_found("territory", territory))?;
            if source.json {
                print_json(&metrics)?;
            } else {
                render_territory_metrics(&metrics);
            }
        }
        TerritoryCommand::Country { country, source } => {
            let (service, records, now) = load_rollup_inputs(&source)?;
            let metrics = service
                .country_metrics(&records, &country, now)
                .ok_or_else(|| AppError::not_found("country", country))?;
            if source.json {
                print_json(&metrics)?;
            } else {
                render_country_metrics(&metrics);
            }
        }
        TerritoryCommand::Trend {
            territory,
            days,
            source,
        } => {
            let days = resolve_trend_days(days, &analytics)?;
            let (service, records, now) = load_rollup_inputs(&source)?;
            let series = service
                .trend_series(&records, &territory, now, days)
                .ok_or_else(|| AppError::not_found("territory", territory.clone()))?;
            if source.json {
                print_json(&series)?;
            } else {
                render_trend(&territory, &series);
            }
        }
        TerritoryCommand::Compare {
            territories,
            metric,
            source,
        } => {
            let (service, records, now) = load_rollup_inputs(&source)?;
            let ranked =
                service.compare_territories(&records, territories.as_slice(), metric, now);
            if source.json {
                print_json(&ranked)?;
            } else {
                render_comparison(metric, &ranked);
            }
        }
        TerritoryCommand::Rep { username, source } => {
            let (service, records, _) = load_rollup_inputs(&source)?;
            let performance = service
                .rep_performance(&records, &username)
                .ok_or_else(|| AppError::not_found("rep", username))?;
            if source.json {
                print_json(&performance)?;
            } else {
                render_rep_performance(&performance);
            }
        }
    }

    Ok(())
}

type RollupInputs = (
    TerritoryRollupService<InMemoryTerritoryCatalog>,
    Vec<LeadRecord>,
    DateTime<Utc>,
);

fn load_rollup_inputs(source: &TerritorySourceArgs) -> Result<RollupInputs, AppError> {
    let catalog = load_catalog(&source.catalog)?;
    let records = load_records(&source.leads_csv)?;
    let now = source.now.unwrap_or_else(|| SystemClock.now());
    Ok((TerritoryRollupService::new(catalog), records, now))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(AppError::Output)?;
    println!("{json}");
    Ok(())
}

pub(crate) fn describe_metric(value: &MetricValue) -> String {
    match value {
        MetricValue::Measured { value } => format!("{value:.1}"),
        MetricValue::Estimated { value, basis } => format!("{value:.1} (estimated: {basis})"),
    }
}

pub(crate) fn render_analytics_report(result: &AnalyticsResult) {
    let summary = &result.executive_summary;
    let key = &summary.key_metrics;

    println!(
        "Sales analytics as of {} ({} records)",
        result.generated_at.format("%Y-%m-%d %H:%M UTC"),
        result.record_count
    );
    println!(
        "- {} leads | {} conversions | {:.1}% conversion rate",
        key.total_leads, key.total_conversions, key.conversion_rate
    );
    println!(
        "- {} open in pipeline ({} hot) | velocity trend {:+.1}% | {} conversions forecast over 30 days",
        key.open_pipeline, key.hot_prospects, key.velocity_trend, key.forecast_next_30_days
    );

    let velocity = &result.sales_velocity;
    let buckets = &velocity.conversions_by_timeframe;
    println!("\nSales velocity");
    println!(
        "- avg {:.1} days to conversion | 0-7: {} | 8-30: {} | 31-90: {} | 90+: {}",
        velocity.avg_time_to_conversion,
        buckets.first_week,
        buckets.first_month,
        buckets.first_quarter,
        buckets.beyond_quarter
    );

    let pipeline = &result.pipeline_health;
    println!("\nPipeline health");
    println!(
        "- {} open | {} qualified | {} hot | bottleneck: {}",
        pipeline.total_pipeline,
        pipeline.qualified_leads,
        pipeline.hot_prospects,
        pipeline.bottleneck_label
    );
    println!(
        "- {} predicted conversions | {:.2} submissions/day over the last 30 days",
        pipeline.predicted_conversions, pipeline.pipeline_velocity
    );

    let benchmarks = &result.performance_benchmarks;
    println!("\nRep benchmarks");
    match &benchmarks.top_performer {
        Some(top) => println!(
            "- top performer {} ({} submissions, {:.1}% conversion, efficiency {:.2})",
            top.username, top.total_submissions, top.conversion_rate, top.efficiency_score
        ),
        None => println!("- no reps to rank"),
    }
    let distribution = &benchmarks.performance_distribution;
    println!(
        "- tiers: high [{}] | medium [{}] | low [{}]",
        distribution.high.join(", "),
        distribution.medium.join(", "),
        distribution.low.join(", ")
    );

    let market = &result.market_intelligence;
    println!("\nMarket segments");
    for segment in &market.segments {
        println!(
            "- {}: {} leads | {:.1}% conversion | avg interest {:.1} | growth {:+.1}%",
            segment.label,
            segment.count,
            segment.conversion_rate,
            segment.avg_interest_level,
            segment.growth_rate
        );
    }
    if market.unclassified_records > 0 {
        println!(
            "- {} records matched no segment rule",
            market.unclassified_records
        );
    }
    println!(
        "- penetration {:.2}% of {} | win rate {:.1}% | sales cycle {} | market share {}",
        market.opportunity.current_penetration,
        market.opportunity.total_addressable_market,
        market.competitive_position.win_rate,
        describe_metric(&market.competitive_position.avg_sales_cycle),
        describe_metric(&market.competitive_position.market_share)
    );

    if !summary.alerts.is_empty() {
        println!("\nAlerts");
        for alert in &summary.alerts {
            println!("- [{}] {}", alert.severity.label(), alert.message);
        }
    }

    println!("\nNext actions");
    for action in &summary.next_actions {
        println!("- {action}");
    }
}

fn render_scoped_metrics(metrics: &ScopedMetrics) {
    println!(
        "- {} leads | {} conversions | {:.1}% conversion | avg interest {:.1}",
        metrics.total_leads, metrics.conversions, metrics.conversion_rate, metrics.avg_interest_level
    );
    println!(
        "- {} open ({} qualified, {} hot) | {:.1} days to close | trend {:+.1}%",
        metrics.open_pipeline,
        metrics.qualified_leads,
        metrics.hot_prospects,
        metrics.time_to_close,
        metrics.velocity_trend
    );
    println!(
        "- top rep {} | avg deal size {}",
        metrics.top_rep.as_deref().unwrap_or("n/a"),
        describe_metric(&metrics.avg_deal_size)
    );
}

fn render_territory_metrics(metrics: &TerritoryMetrics) {
    println!(
        "Territory {} ({}) in {}",
        metrics.territory_name, metrics.territory_id, metrics.country_id
    );
    render_scoped_metrics(&metrics.metrics);
}

fn render_country_metrics(metrics: &CountryMetrics) {
    println!(
        "Country {} ({}) across {} territories",
        metrics.country_name,
        metrics.country_id,
        metrics.territory_ids.len()
    );
    render_scoped_metrics(&metrics.metrics);
}

fn render_trend(territory_id: &str, series: &[DailyTrendPoint]) {
    println!("Daily trend for {territory_id}");
    for point in series {
        println!(
            "  {} | {:>3} leads | {:>3} conversions",
            point.date, point.leads, point.conversions
        );
    }
}

pub(crate) fn render_comparison(metric: ComparisonMetric, ranked: &[TerritoryMetrics]) {
    println!("Territories ranked by {metric}");
    for (position, entry) in ranked.iter().enumerate() {
        println!(
            "  {}. {} | {} leads | {} conversions | {:.1}% | {:.1} days to close",
            position + 1,
            entry.territory_name,
            entry.metrics.total_leads,
            entry.metrics.conversions,
            entry.metrics.conversion_rate,
            entry.metrics.time_to_close
        );
    }
}

pub(crate) fn render_rep_performance(performance: &RepTerritoryPerformance) {
    println!(
        "{}: {} leads | {} conversions | {:.1}% overall",
        performance.username,
        performance.total_leads,
        performance.total_conversions,
        performance.overall_conversion_rate
    );
    for entry in &performance.territories {
        println!(
            "  - {}: {} leads | {} conversions | {:.1}%",
            entry.territory_name, entry.leads, entry.conversions, entry.conversion_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    #[test]
    fn unserializable_output_is_an_error() {
        let keyed_by_bytes = BTreeMap::from([(vec![1_u8], 1_u8)]);
        assert!(matches!(
            print_json(&keyed_by_bytes),
            Err(AppError::Output(_))
        ));
    }

    #[test]
    fn trend_command_rejects_windows_above_maximum() {
        let command = TerritoryCommand::Trend {
            territory: "north".to_string(),
            days: Some(200_000_000),
            source: TerritorySourceArgs {
                leads_csv: PathBuf::from("leads.csv"),
                catalog: PathBuf::from("catalog.json"),
                now: None,
                json: true,
            },
        };

        let err = run_territory(command, AnalyticsConfig::default())
            .expect_err("oversized window rejected");
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn estimated_metrics_name_their_basis() {
        let described = describe_metric(&MetricValue::estimated(21.0, "fixed placeholder"));
        assert_eq!(described, "21.0 (estimated: fixed placeholder)");
        assert_eq!(
            describe_metric(&MetricValue::Measured { value: 4.0 }),
            "4.0"
        );
    }
}
