//! Film review server entry point.
//!
//! Reads its settings from the environment (see [`ServerConfig::from_env`]), loads the model
//! once and serves until Ctrl-C or SIGTERM.

use anyhow::Context;
use film_review_sentiment::review::ReviewPipelineBuilder;
use film_review_sentiment::server::{build_app, AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let addr = config.bind_addr()?;

    tracing::info!(
        weights = %config.artifacts.weights.display(),
        tokenizer = %config.artifacts.tokenizer_dir.display(),
        device = ?config.device,
        validate_input = config.validate_input,
        "starting film review server"
    );

    let pipeline = ReviewPipelineBuilder::distilbert(config.artifacts.clone())
        .device_request(config.device)
        .build()
        .await
        .context("failed to load the film review model")?;

    let state = AppState::new(pipeline.into_dyn(), &config)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!(%addr, "film review server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("film review server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
