//! Vigil Server - REST API for video impairment screening
//!
//! Exposes vigil-core functionality via HTTP endpoints:
//! - POST /train - Train the classifier on the server's dataset
//! - POST /predict - Classify an uploaded video

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use vigil_core::ClassificationService;
use vigil_server::{create_router_with_config, AppState, Config};

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vigil_core=info,vigil_server=info,tower_http=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = Config::from_env();
    info!(
        addr = %config.socket_addr(),
        dataset_root = %config.dataset_root.display(),
        cache_path = %config.cache_path.display(),
        "Starting vigil-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = match ClassificationService::with_ffmpeg(
        config.pipeline(),
        &config.dataset_root,
        &config.cache_path,
    ) {
        Ok(service) => match &config.upload_dir {
            Some(dir) => service.with_upload_dir(dir),
            None => service,
        },
        Err(e) => {
            error!(error = %e, "Failed to initialize video pipeline");
            std::process::exit(1);
        }
    };

    // Warm the cache; a missing or corrupt file just means starting empty
    let loaded = service.cache().load();
    info!(entries = loaded, "Feature cache ready");

    let state = AppState::new(Arc::new(service)).with_max_file_size(config.max_file_size());
    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!("Listening on http://{}", addr);
    info!("Endpoints: POST /train, POST /predict (multipart: video), GET /health, GET /ready, GET /docs");

    // Peer addresses are needed by the rate limiter's key extractor
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
