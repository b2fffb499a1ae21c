use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::analytics_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sales_analytics::clock::SystemClock;
use sales_analytics::config::AppConfig;
use sales_analytics::error::AppError;
use sales_analytics::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        clock: Arc::new(SystemClock),
        analytics: config.analytics,
    };

    let app = analytics_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        total_addressable_market = config.analytics.total_addressable_market,
        trend_days = config.analytics.trend_days,
        "sales analytics service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
