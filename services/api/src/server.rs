use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use sales_bonus::config::AppConfig;
use sales_bonus::error::AppError;
use sales_bonus::telemetry;
use sales_bonus::workflows::bonus::{BonusWorkflowService, CacheBackend, OrangeHrmClient};

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRecordsStore};
use crate::routes::with_bonus_routes;

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
    };

    let store = Arc::new(InMemoryRecordsStore::default());
    let hr = Arc::new(OrangeHrmClient::new(&config.bonus.orangehrm));
    let cache = Arc::new(CacheBackend::from_settings(&config.bonus));
    let service = Arc::new(BonusWorkflowService::new(
        store.clone(),
        hr,
        cache,
        config.bonus.pools,
        config.bonus.cache_ttl,
    ));

    let app = with_bonus_routes(service, store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sales bonus service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
