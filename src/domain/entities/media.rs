use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Media document. `user_id` is immutable after creation; `product_id` is
/// the back-reference stamped by the association coordinator and cleared by
/// cascade deletion. If non-null it should point at a live product that
/// lists this id in `media_ids` (eventual, not guaranteed at every instant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    /// Key of the physical blob in the file store.
    pub file_path: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub fn new(user_id: Uuid, file_path: String, content_type: String, size: i64) -> Self {
        let now = Utc::now();
        Media {
            id: Uuid::new_v4(),
            user_id,
            product_id: None,
            file_path,
            content_type,
            size,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Media> for MediaResponse {
    fn from(media: Media) -> Self {
        MediaResponse {
            id: media.id,
            user_id: media.user_id,
            product_id: media.product_id,
            content_type: media.content_type,
            size: media.size,
            created_at: media.created_at,
        }
    }
}
