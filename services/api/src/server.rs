use crate::cli::ServeArgs;
use crate::routes::{cors_layer, with_complaint_routes, AppState};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use complaint_relay::complaints::{ComplaintService, SmtpRelay};
use complaint_relay::config::AppConfig;
use complaint_relay::error::AppError;
use complaint_relay::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let relay = Arc::new(SmtpRelay::from_config(&config.mail));
    let complaint_service = Arc::new(ComplaintService::new(
        relay,
        config.mail.sender.clone(),
        config.mail.committee.clone(),
    ));

    let app = with_complaint_routes(complaint_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        relay_host = %config.mail.relay_host,
        relay_port = config.mail.relay_port,
        committee = config.mail.committee.len(),
        "anti-ragging reporting service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
