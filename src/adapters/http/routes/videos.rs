use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{CurrentUser, Subscriber},
    },
    app_error::{AppError, AppResult},
};

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/{video_id}", get(get_video))
}

/// Browsing the catalogue needs a session but not a subscription.
async fn list_videos(
    State(app_state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let videos = app_state.videos.list(query.limit.clamp(1, 500)).await?;
    Ok(Json(videos))
}

/// Playback detail carries the host URL; this is the content people pay
/// for, so it sits behind the subscription gate.
async fn get_video(
    State(app_state): State<AppState>,
    Subscriber(_user): Subscriber,
    Path(video_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let video = app_state
        .videos
        .get_by_id(video_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(video))
}
