use crate::infra::parse_instant;
use crate::report::{render_analytics_report, render_comparison, render_rep_performance};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use sales_analytics::analytics::{AnalyticsEngine, LeadId, LeadRecord};
use sales_analytics::clock::{Clock, SystemClock};
use sales_analytics::config::AnalyticsConfig;
use sales_analytics::error::AppError;
use sales_analytics::territory::{
    ComparisonMetric, Country, InMemoryTerritoryCatalog, Territory, TerritoryRollupService,
};

const DEMO_RECORD_COUNT: i64 = 72;
const DEMO_REPS: [&str; 4] = ["avery", "blake", "casey", "devon"];
const DEMO_TERRITORIES: [&str; 4] = ["north", "south", "east", "west"];
const DEMO_DECISION_MAKERS: [&str; 6] = [
    "Owner only",
    "Me and my business partner",
    "Board of directors",
    "",
    "Sarah Johnson, Michael Brown",
    "Just me",
];
const DEMO_BUSINESSES: [&str; 6] = ["Bakery", "Dental", "Fitness", "Books", "Auto", "Florist"];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference instant for the demo dataset (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_demo(args: DemoArgs, analytics: AnalyticsConfig) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(|| SystemClock.now());
    let records = synthetic_records(now);
    let service = TerritoryRollupService::new(demo_catalog());

    println!("Sales analytics demo (synthetic dataset)\n");
    let result = AnalyticsEngine::new(analytics.settings()).analyze(&records, now);
    render_analytics_report(&result);

    println!();
    let ranked = service.compare_territories(
        &records,
        DEMO_TERRITORIES.as_slice(),
        ComparisonMetric::ConversionRate,
        now,
    );
    render_comparison(ComparisonMetric::ConversionRate, &ranked);

    println!("\nRep territory coverage");
    for rep in DEMO_REPS {
        let performance = service
            .rep_performance(&records, rep)
            .ok_or_else(|| AppError::not_found("rep", rep))?;
        render_rep_performance(&performance);
    }

    println!("\nCountry rollups");
    for country in &service.catalog().countries {
        if let Some(metrics) = service.country_metrics(&records, &country.id, now) {
            println!(
                "- {}: {} leads | {} conversions | {:.1}% conversion",
                metrics.country_name,
                metrics.metrics.total_leads,
                metrics.metrics.conversions,
                metrics.metrics.conversion_rate
            );
        }
    }

    Ok(())
}

/// Deterministic lead history spread over the 95 days before `now`.
pub(crate) fn synthetic_records(now: DateTime<Utc>) -> Vec<LeadRecord> {
    (0..DEMO_RECORD_COUNT)
        .map(|index| {
            let slot = index as usize;
            let interest_level = 1 + ((index * 7) % 5) as i32;
            let signed_up = index % 4 == 0 || (interest_level == 5 && index % 3 == 0);
            let decision_makers = DEMO_DECISION_MAKERS[slot % DEMO_DECISION_MAKERS.len()];

            LeadRecord {
                id: LeadId::from(1_000 + index),
                owner_name: format!(
                    "Demo {} {}",
                    DEMO_BUSINESSES[slot % DEMO_BUSINESSES.len()],
                    index
                ),
                interest_level,
                signed_up,
                package_seen: signed_up || index % 3 != 1,
                decision_makers: (!decision_makers.is_empty())
                    .then(|| decision_makers.to_string()),
                timestamp: now - Duration::days((index * 11) % 95) - Duration::hours(index % 9),
                username: (index % 13 != 12)
                    .then(|| DEMO_REPS[slot % DEMO_REPS.len()].to_string()),
                territory: (index % 9 != 8)
                    .then(|| DEMO_TERRITORIES[(slot / 2) % DEMO_TERRITORIES.len()].to_string()),
            }
        })
        .collect()
}

pub(crate) fn demo_catalog() -> InMemoryTerritoryCatalog {
    let territory = |id: &str, name: &str, country_id: &str, reps: &[&str]| Territory {
        id: id.to_string(),
        name: name.to_string(),
        country_id: country_id.to_string(),
        assigned_reps: reps.iter().map(|rep| rep.to_string()).collect(),
    };

    InMemoryTerritoryCatalog::new(
        vec![
            Country {
                id: "us".to_string(),
                name: "United States".to_string(),
                code: Some("US".to_string()),
            },
            Country {
                id: "ca".to_string(),
                name: "Canada".to_string(),
                code: Some("CA".to_string()),
            },
        ],
        vec![
            territory("north", "North", "us", &["avery", "blake"]),
            territory("south", "South", "us", &["casey"]),
            territory("east", "East", "ca", &["devon", "avery"]),
            territory("west", "West", "ca", &["blake"]),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sales_analytics::territory::TerritoryCatalog;

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0)
            .single()
            .expect("valid reference instant")
    }

    #[test]
    fn synthetic_records_are_reproducible() {
        let first = synthetic_records(reference_now());
        let second = synthetic_records(reference_now());
        assert_eq!(first, second);
        assert_eq!(first.len(), DEMO_RECORD_COUNT as usize);
        assert!(first.iter().any(|record| record.username.is_none()));
        assert!(first.iter().any(|record| record.territory.is_none()));
        assert!(first.iter().all(|record| record.timestamp <= reference_now()));
    }

    #[test]
    fn every_demo_rep_and_territory_is_catalogued() {
        let catalog = demo_catalog();
        for territory in DEMO_TERRITORIES {
            assert!(catalog.territory(territory).is_some());
        }
        for rep in DEMO_REPS {
            assert!(!catalog.territories_for_rep(rep).is_empty());
        }
    }

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            now: Some(reference_now()),
        };
        run_demo(args, AnalyticsConfig::default()).expect("demo completes");
    }
}
