use chrono::{DateTime, Duration, TimeZone, Utc};
use sales_analytics::analytics::predictive::RecommendationKind;
use sales_analytics::analytics::rep_stats::{tally_by_rep, RepTally};
use sales_analytics::analytics::{
    calculate_rep_stats, classify_segment, AnalyticsEngine, AnalyticsSettings, BottleneckStage,
    LeadId, LeadRecord, MarketSegment, SalesVelocityMetrics, TrendDirection,
};
use std::collections::BTreeMap;

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0)
        .single()
        .expect("valid reference instant")
}

fn lead(
    id: i64,
    username: Option<&str>,
    interest: i32,
    signed_up: bool,
    days_ago: i64,
) -> LeadRecord {
    LeadRecord {
        id: LeadId::from(id),
        owner_name: format!("Business {id}"),
        interest_level: interest,
        signed_up,
        package_seen: signed_up,
        decision_makers: None,
        timestamp: reference_now() - Duration::days(days_ago),
        username: username.map(str::to_string),
        territory: None,
    }
}

fn mixed_records() -> Vec<LeadRecord> {
    vec![
        lead(1, Some("alice"), 5, true, 3),
        lead(2, Some("alice"), 4, false, 12),
        lead(3, Some("bob"), 2, false, 45),
        lead(4, Some("bob"), 3, true, 70),
        lead(5, None, 1, false, 1),
        lead(6, Some("carol"), 4, true, 20),
    ]
}

#[test]
fn rep_stats_account_for_every_record() {
    let records = mixed_records();
    let stats = calculate_rep_stats(&records);

    let total: usize = stats.iter().map(|rep| rep.total_submissions).sum();
    assert_eq!(total, records.len());
    assert!(stats.iter().any(|rep| rep.username == "Unknown"));

    for rep in &stats {
        assert!((0.0..=100.0).contains(&rep.conversion_rate));
        assert!((0.0..=100.0).contains(&rep.package_seen_rate));
    }
}

#[test]
fn two_record_rep_matches_expected_stats() {
    let records = vec![
        lead(1, Some("rep1"), 4, true, 2),
        lead(2, Some("rep1"), 2, false, 2),
    ];
    let stats = calculate_rep_stats(&records);

    assert_eq!(stats.len(), 1);
    let rep1 = &stats[0];
    assert_eq!(rep1.username, "rep1");
    assert_eq!(rep1.total_submissions, 2);
    assert_eq!(rep1.signed_up, 1);
    assert_eq!(rep1.conversion_rate, 50.0);
    assert_eq!(rep1.avg_interest_level, 3.0);
}

#[test]
fn rep_tallies_compose_across_disjoint_partitions() {
    let records = mixed_records();
    let (left, right) = records.split_at(2);

    let mut merged: BTreeMap<String, RepTally> = tally_by_rep(left);
    for (username, tally) in tally_by_rep(right) {
        merged.entry(username).or_default().merge(&tally);
    }

    assert_eq!(merged, tally_by_rep(&records));
}

#[test]
fn empty_snapshot_produces_zeroed_report() {
    let engine = AnalyticsEngine::default();
    let result = engine.analyze(&[], reference_now());

    assert_eq!(result.record_count, 0);
    assert!(engine.rep_stats(&[]).is_empty());
    assert_eq!(result.sales_velocity, SalesVelocityMetrics::default());
    assert_eq!(result.pipeline_health.total_pipeline, 0);
    assert_eq!(result.pipeline_health.predicted_conversions, 0);
    assert_eq!(result.pipeline_health.pipeline_velocity, 0.0);
    assert_eq!(
        result.pipeline_health.bottleneck_stage,
        BottleneckStage::FinalDecision
    );
    assert!(result.performance_benchmarks.top_performer.is_none());
    assert_eq!(
        result
            .performance_benchmarks
            .performance_distribution
            .rep_count(),
        0
    );
    assert!(result.market_intelligence.segments.is_empty());
    assert_eq!(result.predictive_insights.forecast.next_30_days, 0);
    assert_eq!(result.executive_summary.key_metrics.conversion_rate, 0.0);
}

#[test]
fn repeated_analysis_is_identical() {
    let engine = AnalyticsEngine::new(AnalyticsSettings::default());
    let records = mixed_records();

    let first = engine.analyze(&records, reference_now());
    let second = engine.analyze(&records, reference_now());

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serializes"),
        serde_json::to_string(&second).expect("serializes")
    );
}

#[test]
fn velocity_trend_compares_trailing_windows() {
    let mut records: Vec<LeadRecord> = (0..10)
        .map(|id| lead(id, Some("rep1"), 4, true, 10))
        .collect();
    records.extend((10..15).map(|id| lead(id, Some("rep1"), 4, true, 40)));

    let result = AnalyticsEngine::default().analyze(&records, reference_now());

    assert_eq!(result.sales_velocity.velocity_trend, 100.0);
    assert_eq!(
        result.market_intelligence.opportunity.projected_growth,
        100.0
    );
    assert_eq!(
        result.predictive_insights.trend.direction,
        TrendDirection::Up
    );
}

#[test]
fn distribution_covers_every_rep() {
    let records = vec![
        lead(1, Some("rep1"), 4, true, 1),
        lead(2, Some("rep1"), 3, false, 2),
        lead(3, Some("rep2"), 5, true, 3),
        lead(4, Some("rep2"), 2, true, 4),
        lead(5, Some("rep3"), 1, false, 5),
    ];

    let benchmarks = AnalyticsEngine::default()
        .analyze(&records, reference_now())
        .performance_benchmarks;

    assert_eq!(benchmarks.performance_distribution.rep_count(), 3);
    let top = benchmarks.top_performer.expect("top performer present");
    assert_eq!(top.username, "rep2");
}

#[test]
fn free_text_outside_every_rule_stays_unclassified() {
    assert_eq!(classify_segment(Some("Sarah Johnson, Michael Brown")), None);

    let mut owner = lead(1, Some("rep1"), 4, true, 2);
    owner.decision_makers = Some("Owner only".to_string());
    let mut named = lead(2, Some("rep1"), 3, false, 2);
    named.decision_makers = Some("Sarah Johnson, Michael Brown".to_string());
    let blank = lead(3, Some("rep1"), 2, false, 2);

    let market = AnalyticsEngine::default()
        .analyze(&[owner, named, blank], reference_now())
        .market_intelligence;

    let counted: usize = market.segments.iter().map(|segment| segment.count).sum();
    assert_eq!(counted, 2);
    assert_eq!(market.unclassified_records, 1);
    assert!(market
        .segments
        .iter()
        .all(|segment| matches!(
            segment.segment,
            MarketSegment::OwnerOnly | MarketSegment::Unknown
        )));
    assert!(!market.competitive_position.avg_sales_cycle.is_measured());
}

#[test]
fn weak_pipeline_raises_high_priority_recommendations() {
    let records: Vec<LeadRecord> = (0..10)
        .map(|id| lead(id, Some("rep1"), 2, false, 5))
        .collect();

    let result = AnalyticsEngine::default().analyze(&records, reference_now());
    let kinds: Vec<RecommendationKind> = result
        .predictive_insights
        .recommendations
        .iter()
        .map(|recommendation| recommendation.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![
            RecommendationKind::ConversionOptimization,
            RecommendationKind::LeadGeneration
        ]
    );
    assert!(!result.executive_summary.alerts.is_empty());
    assert!(!result.executive_summary.next_actions.is_empty());
}
