use crate::cli::ServeArgs;
use crate::infra::{AppState, Scheduler, Workflows};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use recruit_ai::config::AppConfig;
use recruit_ai::error::AppError;
use recruit_ai::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const PROPOSAL_EXPIRY_INTERVAL: Duration = Duration::from_secs(60);

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

    let (workflows, dispatcher) = Workflows::build(&config.engine)?;
    tokio::spawn(dispatcher.run());
    tokio::spawn(expire_proposals(workflows.scheduler.clone()));

    let app = with_workflow_routes(&workflows)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruiting workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn expire_proposals(scheduler: Arc<Scheduler>) {
    let mut ticker = tokio::time::interval(PROPOSAL_EXPIRY_INTERVAL);
    loop {
        ticker.tick().await;
        if let Err(error) = scheduler.expire_stale(Utc::now()) {
            warn!(error = %error, "interview proposal expiry sweep failed");
        }
    }
}
