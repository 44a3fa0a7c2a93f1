use crate::cli::ServeArgs;
use crate::infra::{
    default_trainers, AppState, InMemoryOnboardingStore, LoggingNotifications, SimulatedVendor,
};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use hiretrack::config::{AppConfig, MonitorConfig};
use hiretrack::error::AppError;
use hiretrack::telemetry;
use hiretrack::workflows::monitor::{BackgroundCheckMonitor, BackgroundCheckVendor, MonitorPolicy};
use hiretrack::workflows::onboarding::{
    NotificationPublisher, OnboardingRepository, OnboardingService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

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

    let repository = Arc::new(InMemoryOnboardingStore::with_trainers(default_trainers()));
    let notifications = Arc::new(LoggingNotifications::default());
    let monitor = Arc::new(BackgroundCheckMonitor::new(
        Arc::new(SimulatedVendor::default()),
        MonitorPolicy::from_config(&config.monitor),
    ));
    let onboarding_service = Arc::new(OnboardingService::new(repository, notifications, monitor));

    tokio::spawn(poll_background_checks(
        onboarding_service.clone(),
        config.monitor,
    ));

    let app = with_onboarding_routes(onboarding_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "onboarding tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Drive the vendor monitor on the configured cadence for the lifetime of the server.
async fn poll_background_checks<R, N, V>(
    service: Arc<OnboardingService<R, N, V>>,
    config: MonitorConfig,
) where
    R: OnboardingRepository + 'static,
    N: NotificationPublisher + 'static,
    V: BackgroundCheckVendor + 'static,
{
    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(
        interval_secs = config.poll_interval_secs,
        max_polls = config.max_polls,
        "background check polling started"
    );

    loop {
        ticker.tick().await;
        let summary = service.poll_background_checks(Utc::now());
        if summary.polled == 0 && summary.abandoned == 0 {
            debug!("no background checks due");
            continue;
        }
        info!(
            polled = summary.polled,
            applied = summary.applied,
            failed = summary.failed,
            abandoned = summary.abandoned,
            "background check poll round finished"
        );
    }
}
