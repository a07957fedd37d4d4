//! Helm Policy Verifier Server
//!
//! HTTP front for the chart verification pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HELM POLICY VERIFIER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐  │
//! │  │  API      │  │  Blocking     │  │  Inference Pipeline │  │
//! │  │  (Axum)   │─▶│  Verifier     │─▶│  (Arc, read-only)   │  │
//! │  │           │  │  (per request │  │  scaler + OC-SVM    │  │
//! │  │           │  │   workspace)  │  │                     │  │
//! │  └───────────┘  └───────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod handlers;
mod error;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helm_verifier_core::{InferencePipeline, Verifier};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (core `log` records are bridged in by the subscriber)
    init_tracing(&config);

    tracing::info!("Helm Policy Verifier starting ({})", config.environment);
    tracing::info!("Workspace root: {}", config.workspace_dir.display());

    // Artifacts are loaded once and shared read-only
    let pipeline = InferencePipeline::load(&config.preprocessor_path, &config.classifier_path)
        .context("Failed to load model artifacts")?;
    tracing::info!("Model: {:?}", pipeline.status());

    // Build application state
    let verifier = Verifier::new(
        Arc::new(pipeline),
        config.workspace_dir.clone(),
        config.extraction_limits(),
    );
    let state = AppState {
        verifier: Arc::new(verifier),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "helm_verifier_server=debug,helm_verifier_core=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/upload-helm", post(handlers::upload::upload_helm))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
