use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;

use crate::extractors::{JsonBody, UserId};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::tracker::UserTracker;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(load_catalog))
        .route("/status", get(catalog_status))
}

/// 请求体即题单 JSON（可带 `result` 包装）；分类可能需要访问外部服务，耗时与未缓存题数成正比
async fn load_catalog(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    JsonBody(document): JsonBody<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    let summary = tracker.load_catalog(document).await?;
    Ok(ok(summary))
}

async fn catalog_status(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(tracker.status().await?))
}
