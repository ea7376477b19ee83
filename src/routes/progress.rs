use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extractors::{JsonBody, UserId};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::tracker::progress::{
    CompletedScope, DifficultyFilter, InvalidQuery, ListKind, ProblemEntry,
};
use crate::tracker::UserTracker;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_progress))
        .route("/complete", post(mark_complete))
        .route("/skip", post(mark_skip))
        .route("/revisit", post(mark_revisit))
        .route("/lists/:kind", get(get_list))
        .route("/completed/:scope/:difficulty", get(get_completed))
        .route("/reset", post(reset_progress))
        .route("/export", get(export_progress))
        .route("/import", post(import_progress))
}

#[derive(Debug, Deserialize)]
struct ProblemRequest {
    url: String,
}

impl ProblemRequest {
    fn url(&self) -> Result<&str, AppError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AppError::bad_request("INVALID_PARAMETER", "url must not be empty"));
        }
        Ok(url)
    }
}

fn invalid_parameter(e: InvalidQuery) -> AppError {
    AppError::bad_request("INVALID_PARAMETER", &e.to_string())
}

#[derive(Debug, Serialize)]
struct UrlList {
    urls: Vec<ProblemEntry>,
}

async fn get_progress(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(tracker.progress().await?))
}

async fn mark_complete(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProblemRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let url = req.url()?;
    let tracker = UserTracker::acquire(&state, &user_id).await;
    match tracker.mark_complete(url).await? {
        Some(view) => Ok(ok(serde_json::json!({ "progress": view }))),
        None => Err(AppError::conflict(
            "ALREADY_COMPLETED",
            "Problem already completed or not in the catalog",
        )),
    }
}

async fn mark_skip(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProblemRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let url = req.url()?;
    let tracker = UserTracker::acquire(&state, &user_id).await;
    tracker
        .mark_skip(url)
        .await?
        .map(ok)
        .ok_or_else(|| AppError::conflict("SKIP_REJECTED", "Could not skip problem"))
}

async fn mark_revisit(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProblemRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let url = req.url()?;
    let tracker = UserTracker::acquire(&state, &user_id).await;
    match tracker.mark_revisit(url).await? {
        Some(view) => Ok(ok(serde_json::json!({ "progress": view }))),
        None => Err(AppError::conflict(
            "ALREADY_FLAGGED",
            "Problem is already marked for revisit",
        )),
    }
}

async fn get_list(
    UserId(user_id): UserId,
    Path(kind): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let kind: ListKind = kind.parse().map_err(invalid_parameter)?;
    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(UrlList {
        urls: tracker.list(kind).await?,
    }))
}

async fn get_completed(
    UserId(user_id): UserId,
    Path((scope, difficulty)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let scope: CompletedScope = scope.parse().map_err(invalid_parameter)?;
    let filter: DifficultyFilter = difficulty.parse().map_err(invalid_parameter)?;

    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(UrlList {
        urls: tracker.completed(scope, filter).await?,
    }))
}

async fn reset_progress(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    let view = tracker.reset().await?;
    Ok(ok(serde_json::json!({ "progress": view })))
}

async fn export_progress(
    UserId(user_id): UserId,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(tracker.export().await?))
}

async fn import_progress(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    JsonBody(document): JsonBody<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tracker = UserTracker::acquire(&state, &user_id).await;
    let view = tracker.import(document).await?;
    Ok(ok(serde_json::json!({ "progress": view })))
}
