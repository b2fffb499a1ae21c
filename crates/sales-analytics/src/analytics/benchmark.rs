use super::rates::{daily_submission_rate, percentage, ratio};
use super::records::LeadRecord;
use super::rep_stats::{tally_by_rep, RepStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub username: String,
    pub efficiency_score: f64,
    pub conversion_rate: f64,
    pub avg_interest_level: f64,
    pub total_submissions: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAverages {
    pub conversion_rate: f64,
    pub avg_interest_level: f64,
    pub daily_submissions: f64,
}

/// Reps split into tiers by conversion rate, best first within each tier.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDistribution {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl PerformanceDistribution {
    pub fn rep_count(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBenchmarks {
    pub top_performer: Option<TopPerformer>,
    pub team_averages: TeamAverages,
    pub performance_distribution: PerformanceDistribution,
}

/// Ranking heuristic: average interest weighted by the conversion fraction.
pub fn efficiency_score(stats: &RepStats) -> f64 {
    stats.avg_interest_level * (stats.conversion_rate / 100.0)
}

pub fn analyze_benchmarks(records: &[LeadRecord]) -> PerformanceBenchmarks {
    let reps: Vec<RepStats> = tally_by_rep(records)
        .iter()
        .map(|(username, tally)| tally.to_stats(username))
        .collect();

    PerformanceBenchmarks {
        top_performer: top_performer(&reps),
        team_averages: team_averages(records),
        performance_distribution: distribute(&reps),
    }
}

/// Highest efficiency score over reps in username order; the first maximum wins ties.
fn top_performer(reps: &[RepStats]) -> Option<TopPerformer> {
    let mut best: Option<(&RepStats, f64)> = None;
    for stats in reps {
        let score = efficiency_score(stats);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((stats, score));
        }
    }

    best.map(|(stats, efficiency_score)| TopPerformer {
        username: stats.username.clone(),
        efficiency_score,
        conversion_rate: stats.conversion_rate,
        avg_interest_level: stats.avg_interest_level,
        total_submissions: stats.total_submissions,
    })
}

fn team_averages(records: &[LeadRecord]) -> TeamAverages {
    let converted = records.iter().filter(|record| record.signed_up).count();
    let interest_sum: i64 = records
        .iter()
        .map(|record| i64::from(record.interest_level))
        .sum();

    TeamAverages {
        conversion_rate: percentage(converted, records.len()),
        avg_interest_level: ratio(interest_sum as f64, records.len()),
        daily_submissions: daily_submission_rate(records),
    }
}

/// Top fifth → high, bottom fifth → low, using ceiling boundaries `ceil(n/5)` and
/// `ceil(4n/5)`. Small teams leave some tiers empty.
fn distribute(reps: &[RepStats]) -> PerformanceDistribution {
    let mut ranked: Vec<&RepStats> = reps.iter().collect();
    ranked.sort_by(|a, b| {
        b.conversion_rate
            .total_cmp(&a.conversion_rate)
            .then_with(|| a.username.cmp(&b.username))
    });

    let count = ranked.len();
    let high_end = (count + 4) / 5;
    let medium_end = (count * 4 + 4) / 5;
    let names = |slice: &[&RepStats]| -> Vec<String> {
        slice.iter().map(|stats| stats.username.clone()).collect()
    };

    PerformanceDistribution {
        high: names(&ranked[..high_end]),
        medium: names(&ranked[high_end..medium_end]),
        low: names(&ranked[medium_end..]),
    }
}
