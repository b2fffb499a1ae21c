use super::rates::{percentage, ratio};
use super::records::LeadRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-representative totals and rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepStats {
    pub username: String,
    pub total_submissions: usize,
    pub signed_up: usize,
    pub conversion_rate: f64,
    pub avg_interest_level: f64,
    pub package_seen: usize,
    pub package_seen_rate: f64,
}

/// Raw sums for one representative. Tallies compose by addition, so stats computed
/// over disjoint record sets can be merged without revisiting the records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepTally {
    pub submissions: usize,
    pub signed_up: usize,
    pub interest_sum: i64,
    pub package_seen: usize,
}

impl RepTally {
    pub fn record(&mut self, record: &LeadRecord) {
        self.submissions += 1;
        self.interest_sum += i64::from(record.interest_level);
        if record.signed_up {
            self.signed_up += 1;
        }
        if record.package_seen {
            self.package_seen += 1;
        }
    }

    pub fn merge(&mut self, other: &RepTally) {
        self.submissions += other.submissions;
        self.signed_up += other.signed_up;
        self.interest_sum += other.interest_sum;
        self.package_seen += other.package_seen;
    }

    pub fn to_stats(&self, username: &str) -> RepStats {
        RepStats {
            username: username.to_string(),
            total_submissions: self.submissions,
            signed_up: self.signed_up,
            conversion_rate: percentage(self.signed_up, self.submissions),
            avg_interest_level: ratio(self.interest_sum as f64, self.submissions),
            package_seen: self.package_seen,
            package_seen_rate: percentage(self.package_seen, self.submissions),
        }
    }
}

/// Single pass grouping of records by representative, keyed in username order.
pub fn tally_by_rep<'a, I>(records: I) -> BTreeMap<String, RepTally>
where
    I: IntoIterator<Item = &'a LeadRecord>,
{
    let mut tallies: BTreeMap<String, RepTally> = BTreeMap::new();
    for record in records {
        tallies
            .entry(record.rep_key().to_string())
            .or_default()
            .record(record);
    }
    tallies
}

/// Stats for every representative present, busiest first.
///
/// Ordered by `total_submissions` descending, then `signed_up` descending. Reps that
/// still tie keep username order.
pub fn calculate_rep_stats(records: &[LeadRecord]) -> Vec<RepStats> {
    let mut stats: Vec<RepStats> = tally_by_rep(records)
        .iter()
        .map(|(username, tally)| tally.to_stats(username))
        .collect();

    stats.sort_by(|a, b| {
        b.total_submissions
            .cmp(&a.total_submissions)
            .then_with(|| b.signed_up.cmp(&a.signed_up))
    });
    stats
}

/// Re-orders already computed stats by sign-ups, then conversion rate.
pub fn signup_leaderboard(stats: &[RepStats]) -> Vec<RepStats> {
    let mut leaderboard = stats.to_vec();
    leaderboard.sort_by(|a, b| {
        b.signed_up
            .cmp(&a.signed_up)
            .then_with(|| b.conversion_rate.total_cmp(&a.conversion_rate))
    });
    leaderboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::records::fixtures::*;
    use crate::analytics::records::UNKNOWN_REP;

    #[test]
    fn computes_rates_for_single_rep() {
        let records = vec![
            owned_by(lead(1, 4, true), "rep1"),
            owned_by(lead(2, 2, false), "rep1"),
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
    fn empty_input_returns_no_stats() {
        assert!(calculate_rep_stats(&[]).is_empty());
    }

    #[test]
    fn orders_by_volume_then_signups() {
        let records = vec![
            owned_by(lead(1, 3, false), "alpha"),
            owned_by(lead(2, 3, true), "bravo"),
            owned_by(lead(3, 3, false), "charlie"),
            owned_by(lead(4, 3, false), "charlie"),
            lead(5, 3, false),
        ];

        let order: Vec<String> = calculate_rep_stats(&records)
            .into_iter()
            .map(|stats| stats.username)
            .collect();
        assert_eq!(order, vec!["charlie", "bravo", UNKNOWN_REP, "alpha"]);
    }

    #[test]
    fn leaderboard_reorders_without_recomputing() {
        let records = vec![
            owned_by(lead(1, 3, true), "alpha"),
            owned_by(lead(2, 3, false), "alpha"),
            owned_by(lead(3, 3, false), "alpha"),
            owned_by(lead(4, 3, true), "bravo"),
        ];

        let stats = calculate_rep_stats(&records);
        assert_eq!(stats[0].username, "alpha");

        let leaderboard = signup_leaderboard(&stats);
        assert_eq!(leaderboard[0].username, "bravo");
        assert_eq!(leaderboard[0], stats[1]);
    }

    #[test]
    fn tallies_merge_across_disjoint_partitions() {
        let records = vec![
            owned_by(lead(1, 5, true), "alpha"),
            owned_by(lead(2, 1, false), "bravo"),
            owned_by(lead(3, 3, true), "alpha"),
            lead(4, 2, false),
        ];
        let (left, right) = records.split_at(2);

        let mut merged = tally_by_rep(left);
        for (username, tally) in tally_by_rep(right) {
            merged.entry(username).or_default().merge(&tally);
        }

        assert_eq!(merged, tally_by_rep(&records));
    }
}
