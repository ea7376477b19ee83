use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::store::migrate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "lookup": {
            "enabled": state.lookup().is_enabled(),
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// 迁移版本可读即视为就绪
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match migrate::get_current_version(state.store()) {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn database_health(
    State(state): State<AppState>,
) -> impl axum::response::IntoResponse {
    let start = Instant::now();
    let healthy = state.store().has_catalog("__health_check__").is_ok();
    let latency_us = start.elapsed().as_micros() as u64;
    let cached_difficulties = state.store().difficulty_cache.len();

    Json(serde_json::json!({
        "healthy": healthy,
        "latencyUs": latency_us,
        "cachedDifficulties": cached_difficulties,
    }))
}
