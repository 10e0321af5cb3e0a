use anyhow::Context;
use axum::http::HeaderValue;

use bizdir_api::app::{self, AppServices, services::Storage};
use bizdir_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizdir_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting");

    let storage = Storage::from_config(&config).await?;
    let services = AppServices::from_config(&config, &storage)?;
    tracing::info!(verifier = ?services.verifier.mode(), "identity verification configured");
    let cors_origin = config
        .cors_origin
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()
        .context("CORS_ORIGIN is not a valid header value")?;

    let app = app::build_app(services, cors_origin);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = storage.pool() {
        pool.close().await;
    }
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
