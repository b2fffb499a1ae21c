//! Territory and country scoped rollups backed by an external territory catalog.

mod catalog;
mod rollup;

pub use catalog::{Country, InMemoryTerritoryCatalog, Territory, TerritoryCatalog};
pub use rollup::{
    ComparisonMetric, CountryMetrics, DailyTrendPoint, RepTerritoryEntry,
    RepTerritoryPerformance, ScopedMetrics, TerritoryMetrics, TerritoryRollupService,
    UnknownComparisonMetric, DEFAULT_TREND_DAYS, MAX_TREND_DAYS,
};
