use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub name: String,
    pub country_id: String,
    #[serde(default)]
    pub assigned_reps: Vec<String>,
}

/// Lookup seam for the externally maintained territory catalog.
///
/// Unknown identifiers resolve to `None` or an empty list; implementations must not fail
/// on them.
pub trait TerritoryCatalog: Send + Sync {
    fn territory(&self, territory_id: &str) -> Option<Territory>;
    fn country(&self, country_id: &str) -> Option<Country>;
    fn territories_in_country(&self, country_id: &str) -> Vec<Territory>;
    fn territories_for_rep(&self, username: &str) -> Vec<Territory>;
}

/// Catalog snapshot held in memory, typically deserialized from a JSON export.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTerritoryCatalog {
    #[serde(default)]
    pub countries: Vec<Country>,
    #[serde(default)]
    pub territories: Vec<Territory>,
}

impl InMemoryTerritoryCatalog {
    pub fn new(countries: Vec<Country>, territories: Vec<Territory>) -> Self {
        Self {
            countries,
            territories,
        }
    }
}

impl TerritoryCatalog for InMemoryTerritoryCatalog {
    fn territory(&self, territory_id: &str) -> Option<Territory> {
        self.territories
            .iter()
            .find(|territory| territory.id == territory_id)
            .cloned()
    }

    fn country(&self, country_id: &str) -> Option<Country> {
        self.countries
            .iter()
            .find(|country| country.id == country_id)
            .cloned()
    }

    fn territories_in_country(&self, country_id: &str) -> Vec<Territory> {
        self.territories
            .iter()
            .filter(|territory| territory.country_id == country_id)
            .cloned()
            .collect()
    }

    fn territories_for_rep(&self, username: &str) -> Vec<Territory> {
        self.territories
            .iter()
            .filter(|territory| territory.assigned_reps.iter().any(|rep| rep == username))
            .cloned()
            .collect()
    }
}
