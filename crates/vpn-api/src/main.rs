mod auth;
mod config;
mod dto;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use vpn_core::{ConfigGenerator, EndpointService, TemplateConfigGenerator};

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    // Compute provider
    let provider = vpn_infra::build_provider().expect("failed to build compute provider");
    tracing::info!(provider = provider.name(), "compute provider ready");

    // Tunnel config
    let generator: Arc<dyn ConfigGenerator> = match &config.config_template {
        Some(path) => Arc::new(
            TemplateConfigGenerator::from_file(path).expect("failed to load VPN config template"),
        ),
        None => Arc::new(TemplateConfigGenerator::default()),
    };

    let service = EndpointService::new(provider, generator, config.provisioner());

    // Adopt endpoints left by a previous run before accepting requests
    let adopted = service
        .restore()
        .await
        .expect("failed to restore endpoints");
    tracing::info!(adopted, "endpoints restored");

    let state = AppState {
        service,
        config: config.clone(),
    };

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting VPN endpoint API");

    axum::serve(listener, app).await.expect("server error");
}
