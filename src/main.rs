//! match-pipeline server entry point.
//!
//! Starts the Axum HTTP server and, when enabled, the batch consumer.

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use match_pipeline::api;
use match_pipeline::bootstrap::Backends;
use match_pipeline::config::PipelineConfig;
use match_pipeline::service::run_batches;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = PipelineConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, topic = %config.topic, "starting match-pipeline");

    // Connect backends
    let backends = Backends::connect(&config).await?;

    // Start the consumer
    let consumer_task = if config.consumer_enabled {
        let mut source = backends.batch_source(&config)?;
        let consumer = backends.batch_consumer();
        Some(tokio::spawn(async move {
            run_batches(source.as_mut(), &consumer).await
        }))
    } else {
        tracing::info!("batch consumer disabled");
        None
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(backends.app_state(&config));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    match consumer_task {
        Some(task) => tokio::select! {
            served = server => served?,
            joined = task => {
                // The consumer only returns on failure; stop so the batch is redelivered.
                joined??;
            }
        },
        None => server.await?,
    }

    tracing::info!("match-pipeline stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
