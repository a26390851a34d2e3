use anyhow::Result;
use monitor_service::{config::MonitorConfig, routes, scheduler, MonitorState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize telemetry (logging and metrics)
    telemetry::init_with_service("monitor-service");

    let config = MonitorConfig::from_env()?;
    info!(
        bind = %config.bind_addr,
        zones = config.zones.len(),
        parking_slots = config.parking_slots,
        "starting monitor service"
    );

    let bind_addr = config.bind_addr.clone();
    let refresh_interval = config.refresh_interval;
    let state = MonitorState::new(config)?;

    let (refresh_token, refresh_task) =
        scheduler::spawn_refresh_loop(state.clone(), refresh_interval);

    let app = routes::router(state);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("monitor service listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_token))
        .await?;

    refresh_task.await.ok();
    info!("monitor service shutdown complete");
    Ok(())
}

async fn shutdown_signal(refresh_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        _ = terminate => {
            info!("received terminate signal");
        },
    }

    info!("shutting down gracefully...");
    refresh_token.cancel();
}
