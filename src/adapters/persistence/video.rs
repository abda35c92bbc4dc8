use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::videos::VideoRepo,
    domain::entities::video::VideoProfile,
};

const SELECT_COLS: &str =
    "id, title, thumbnail_url, vimeo_url, vimeo_id, category_id, created_date";

fn row_to_profile(row: sqlx::postgres::PgRow) -> VideoProfile {
    VideoProfile {
        id: row.get("id"),
        title: row.get("title"),
        thumbnail_url: row.get("thumbnail_url"),
        vimeo_url: row.get("vimeo_url"),
        vimeo_id: row.get("vimeo_id"),
        category_id: row.get("category_id"),
        created_date: row.get("created_date"),
    }
}

#[async_trait]
impl VideoRepo for PostgresPersistence {
    async fn list(&self, limit: i64) -> AppResult<Vec<VideoProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM videos ORDER BY created_date DESC LIMIT $1",
            SELECT_COLS
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn get_by_id(&self, video_id: Uuid) -> AppResult<Option<VideoProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM videos WHERE id = $1", SELECT_COLS))
            .bind(video_id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }
}
