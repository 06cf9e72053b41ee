use crate::cli::ServeArgs;
use crate::infra::{build_lead_service, spawn_store_sweeper, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_capture::config::AppConfig;
use lead_capture::error::AppError;
use lead_capture::leads::InMemoryVerificationStore;
use lead_capture::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.leads.uses_placeholder_guide() {
        warn!("GAMMA_URL not set; access links will point at a placeholder");
    }
    if config.leads.echo_verification_code {
        warn!("verification codes are echoed in API responses");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = InMemoryVerificationStore::default();
    let lead_service = Arc::new(build_lead_service(&config, store.clone())?);
    let _sweeper = spawn_store_sweeper(store);

    let app = with_operational_routes(lead_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead capture service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
