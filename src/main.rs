//! Main entry point for the Virtual Try-On Serving Gateway

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tryon_gateway::{
    api,
    backend::{http_backend::RemoteModelLoader, BackendHandle, ModelProvider},
    config::Settings,
    gateway::{GatewayOptions, TryOnGateway},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    if settings.logging.format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    }

    info!("Starting Virtual Try-On Serving Gateway");
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    // Backend handle; nothing is loaded until first demand or the startup load below
    let backend = Arc::new(BackendHandle::new(Arc::new(RemoteModelLoader::new(
        settings.model.clone(),
    ))));

    if settings.server.load_on_startup {
        let backend = backend.clone();
        tokio::spawn(async move {
            backend.ensure_loaded().await;
        });
    }

    let gateway = Arc::new(TryOnGateway::new(
        backend,
        GatewayOptions::from_settings(&settings),
    ));

    let settings = Arc::new(settings);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Create application state
    let app_state = Arc::new(AppState {
        settings,
        gateway,
    });

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
