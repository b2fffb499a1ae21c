use crate::infra::{deserialize_optional_instant, resolve_trend_days, AppState, LeadSource};
use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use sales_analytics::analytics::{signup_leaderboard, AnalyticsResult, RepStats};
use sales_analytics::error::AppError;
use sales_analytics::territory::{
    ComparisonMetric, CountryMetrics, DailyTrendPoint, InMemoryTerritoryCatalog,
    RepTerritoryPerformance, TerritoryMetrics, TerritoryRollupService,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyticsRequest {
    #[serde(flatten)]
    pub(crate) source: LeadSource,
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TerritoryRequest {
    #[serde(flatten)]
    pub(crate) source: LeadSource,
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub(crate) now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) catalog: InMemoryTerritoryCatalog,
    /// Trend length; falls back to the configured default.
    #[serde(default)]
    pub(crate) days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComparisonRequest {
    #[serde(flatten)]
    pub(crate) source: LeadSource,
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub(crate) now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) catalog: InMemoryTerritoryCatalog,
    pub(crate) territory_ids: Vec<String>,
    #[serde(default)]
    pub(crate) metric: Option<ComparisonMetric>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RepReportResponse {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) rep_stats: Vec<RepStats>,
    pub(crate) leaderboard: Vec<RepStats>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrendResponse {
    pub(crate) territory_id: String,
    pub(crate) days: u32,
    pub(crate) series: Vec<DailyTrendPoint>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ComparisonResponse {
    pub(crate) metric: ComparisonMetric,
    pub(crate) territories: Vec<TerritoryMetrics>,
}

pub(crate) fn analytics_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/analytics/report", post(analytics_report_endpoint))
        .route("/api/v1/analytics/reps", post(rep_stats_endpoint))
        .route(
            "/api/v1/territories/compare",
            post(territory_comparison_endpoint),
        )
        .route(
            "/api/v1/territories/:territory_id/metrics",
            post(territory_metrics_endpoint),
        )
        .route(
            "/api/v1/territories/:territory_id/trend",
            post(territory_trend_endpoint),
        )
        .route(
            "/api/v1/countries/:country_id/metrics",
            post(country_metrics_endpoint),
        )
        .route(
            "/api/v1/reps/:username/territories",
            post(rep_territories_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn analytics_report_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<AnalyticsResult>, AppError> {
    let Json(payload) = payload?;
    let now = state.resolve_now(payload.now);
    let records = payload.source.into_records()?;
    debug!(records = records.len(), "analytics report requested");

    Ok(Json(state.engine().analyze(&records, now)))
}

pub(crate) async fn rep_stats_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<RepReportResponse>, AppError> {
    let Json(payload) = payload?;
    let generated_at = state.resolve_now(payload.now);
    let records = payload.source.into_records()?;
    let rep_stats = state.engine().rep_stats(&records);
    let leaderboard = signup_leaderboard(&rep_stats);

    Ok(Json(RepReportResponse {
        generated_at,
        rep_stats,
        leaderboard,
    }))
}

pub(crate) async fn territory_metrics_endpoint(
    Extension(state): Extension<AppState>,
    Path(territory_id): Path<String>,
    payload: Result<Json<TerritoryRequest>, JsonRejection>,
) -> Result<Json<TerritoryMetrics>, AppError> {
    let Json(payload) = payload?;
    let now = state.resolve_now(payload.now);
    let records = payload.source.into_records()?;
    let service = TerritoryRollupService::new(payload.catalog);

    service
        .territory_metrics(&records, &territory_id, now)
        .map(Json)
        .ok_or_else(|| AppError::not_found("territory", territory_id))
}

pub(crate) async fn territory_trend_endpoint(
    Extension(state): Extension<AppState>,
    Path(territory_id): Path<String>,
    payload: Result<Json<TerritoryRequest>, JsonRejection>,
) -> Result<Json<TrendResponse>, AppError> {
    let Json(payload) = payload?;
    let now = state.resolve_now(payload.now);
    let days = resolve_trend_days(payload.days, &state.analytics)?;
    let records = payload.source.into_records()?;
    let service = TerritoryRollupService::new(payload.catalog);

    let series = service
        .trend_series(&records, &territory_id, now, days)
        .ok_or_else(|| AppError::not_found("territory", territory_id.clone()))?;

    Ok(Json(TrendResponse {
        territory_id,
        days,
        series,
    }))
}

pub(crate) async fn territory_comparison_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ComparisonRequest>, JsonRejection>,
) -> Result<Json<ComparisonResponse>, AppError> {
    let Json(payload) = payload?;
    let now = state.resolve_now(payload.now);
    let metric = payload.metric.unwrap_or(ComparisonMetric::ConversionRate);
    let records = payload.source.into_records()?;
    let service = TerritoryRollupService::new(payload.catalog);

    let territories =
        service.compare_territories(&records, payload.territory_ids.as_slice(), metric, now);
    Ok(Json(ComparisonResponse {
        metric,
        territories,
    }))
}

pub(crate) async fn country_metrics_endpoint(
    Extension(state): Extension<AppState>,
    Path(country_id): Path<String>,
    payload: Result<Json<TerritoryRequest>, JsonRejection>,
) -> Result<Json<CountryMetrics>, AppError> {
    let Json(payload) = payload?;
    let now = state.resolve_now(payload.now);
    let records = payload.source.into_records()?;
    let service = TerritoryRollupService::new(payload.catalog);

    service
        .country_metrics(&records, &country_id, now)
        .map(Json)
        .ok_or_else(|| AppError::not_found("country", country_id))
}

pub(crate) async fn rep_territories_endpoint(
    Path(username): Path<String>,
    payload: Result<Json<TerritoryRequest>, JsonRejection>,
) -> Result<Json<RepTerritoryPerformance>, AppError> {
    let Json(payload) = payload?;
    let records = payload.source.into_records()?;
    let service = TerritoryRollupService::new(payload.catalog);

    service
        .rep_performance(&records, &username)
        .map(Json)
        .ok_or_else(|| AppError::not_found("rep", username))
}
