use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group key used for records that carry no owning representative.
pub const UNKNOWN_REP: &str = "Unknown";

/// Identifier assigned by the Lead Store; either a numeric key or an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadId {
    Numeric(i64),
    Opaque(String),
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadId::Numeric(value) => write!(f, "{value}"),
            LeadId::Opaque(value) => f.write_str(value),
        }
    }
}

impl From<i64> for LeadId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for LeadId {
    fn from(value: &str) -> Self {
        Self::Opaque(value.to_string())
    }
}

/// One prospect intake entry as supplied by the Lead Store.
///
/// `interest_level` is expected to sit in `1..=5`. Values outside that range are
/// aggregated as given; validation belongs to the Lead Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub owner_name: String,
    pub interest_level: i32,
    pub signed_up: bool,
    pub package_seen: bool,
    #[serde(default)]
    pub decision_makers: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
}

impl LeadRecord {
    /// Representative grouping key; absent usernames collapse into [`UNKNOWN_REP`].
    pub fn rep_key(&self) -> &str {
        self.username.as_deref().unwrap_or(UNKNOWN_REP)
    }

    /// Whole days elapsed between submission and `now` (negative for future timestamps).
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_days()
    }

    /// Fractional days elapsed between submission and `now`.
    pub fn fractional_age_in_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_seconds() as f64 / Duration::days(1).num_seconds() as f64
    }

    pub fn in_territory(&self, territory_id: &str) -> bool {
        self.territory.as_deref() == Some(territory_id)
    }
}
