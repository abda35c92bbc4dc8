use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// Video metadata as served to clients. The upload/transcode side lives with
/// the external video host; this service only reads.
#[derive(Debug, Clone, Serialize)]
pub struct VideoProfile {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub vimeo_url: Option<String>,
    pub vimeo_id: Option<String>,
    pub category_id: Option<Uuid>,
    pub created_date: Option<NaiveDateTime>,
}
