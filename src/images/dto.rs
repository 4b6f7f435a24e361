use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::ImageRecord;

/// A stored image as returned to its owner.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub url: String,
    pub remote_id: String,
    pub created_at: OffsetDateTime,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
            remote_id: record.remote_id,
            created_at: record.created_at,
        }
    }
}

/// JSON upload variant: the image payload as a base64 string.
#[derive(Debug, Deserialize)]
pub struct UploadBase64Request {
    pub image_b64: String,
}
