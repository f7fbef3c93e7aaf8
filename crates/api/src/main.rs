use anyhow::Context;
use tokio::signal;
use tracing::info;

use regionhub_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    regionhub_observability::init();

    let settings = Settings::load().context("failed to load settings")?;
    let app = regionhub_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(&settings.http.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.http.bind_addr))?;

    info!(
        addr = %listener.local_addr()?,
        persistent = settings.use_persistent_stores,
        create_channel = %settings.queue.create_region_channel,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
