mod config;
mod dto;
mod error;
mod gateway;
mod handlers;
mod mailer;
mod prompt;
mod router;
mod service;

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use gateway::{GeminiClient, TextGenerator};
use handlers::AppState;
use mailer::{Mailer, SmtpMailer};
use service::PolishService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {e}");
        panic!("failed to load configuration: {e}");
    });
    cfg.validate().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {e}");
        panic!("invalid configuration: {e}");
    });
    tracing::info!("Successfully loaded config: {:?}", cfg);

    // Model client, if a key is available
    let generator: Option<Arc<dyn TextGenerator>> = cfg.api_key().and_then(|key| {
        match GeminiClient::new(
            key,
            cfg.gemini_model.clone(),
            &cfg.gemini_base_url,
            Duration::from_secs(cfg.request_timeout_secs),
        ) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn TextGenerator>),
            Err(e) => {
                tracing::error!("Error initializing AI client: {e}");
                None
            }
        }
    });
    if generator.is_none() && cfg.deployment.requires_api_key() {
        tracing::error!("AI client is required in {:?} mode", cfg.deployment);
        panic!("AI client could not be initialized");
    }

    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(cfg.smtp()));

    let state = AppState {
        polisher: PolishService::new(generator),
        mailer,
    };

    let static_dir = cfg
        .deployment
        .serves_frontend()
        .then_some(cfg.static_dir.as_str());
    let router = router::build_router(state, static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to port {}: {e}", cfg.port);
            panic!("failed to bind to port {}: {e}", cfg.port);
        });

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Draft polisher starting, listening on {}", addr),
        Err(e) => tracing::warn!("Listening, but local address is unknown: {e}"),
    }

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    }
}
