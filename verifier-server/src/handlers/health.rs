//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use helm_verifier_core::constants::CORE_VERSION;
use helm_verifier_core::ModelStatus;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    core_version: &'static str,
    environment: String,
    timestamp: i64,
    model: ModelStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        core_version: CORE_VERSION,
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().timestamp(),
        model: state.verifier.pipeline().status(),
    })
}
