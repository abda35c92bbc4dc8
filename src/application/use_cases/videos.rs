use async_trait::async_trait;
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::video::VideoProfile};

/// Read surface for video metadata. Ingestion (upload, external host
/// integration, thumbnails) is owned by a separate service; the handlers
/// here only list and fetch so the subscription gate has something to guard.
#[async_trait]
pub trait VideoRepo: Send + Sync {
    /// Newest first.
    async fn list(&self, limit: i64) -> AppResult<Vec<VideoProfile>>;
    async fn get_by_id(&self, video_id: Uuid) -> AppResult<Option<VideoProfile>>;
}
