use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::extractors::{OptionalJsonBody, UserId};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::tracker::UserTracker;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate_session))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSessionRequest {
    #[serde(default)]
    force_new: bool,
}

async fn generate_session(
    UserId(user_id): UserId,
    State(state): State<AppState>,
    OptionalJsonBody(body): OptionalJsonBody<GenerateSessionRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let req = body.unwrap_or_default();
    let tracker = UserTracker::acquire(&state, &user_id).await;
    Ok(ok(tracker.session(req.force_new).await?))
}
