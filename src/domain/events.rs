use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_DELETED_TOPIC: &str = "user.deleted";
pub const PRODUCT_DELETED_TOPIC: &str = "product.deleted";

/// Published on `user.deleted`. The wire form is `{"id": "..."}`; older
/// producers sent the bare id string and consumers still accept that.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDeleted {
    pub id: Uuid,
}

/// Published on `product.deleted`. `media_ids` is the point-in-time snapshot
/// of the product's list taken before the local delete, so the consumer can
/// remove media without a lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub id: Uuid,
    #[serde(rename = "mediaIds", default)]
    pub media_ids: Vec<Uuid>,
}

impl ProductDeleted {
    pub fn to_payload(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl UserDeleted {
    pub fn to_payload(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decoded `product.deleted` payload. The topic carries two formats: the
/// structured object, and a legacy bare product id string. The structured
/// form with media ids drives direct list-based deletion; everything else
/// degrades to deletion via a product-id lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum ProductDeletedPayload {
    ByMediaIds { product_id: Uuid, media_ids: Vec<Uuid> },
    ByProductId(Uuid),
}

pub fn parse_product_deleted(payload: &str) -> Result<ProductDeletedPayload, AppError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(AppError::MalformedEvent("empty product.deleted payload".into()));
    }

    if trimmed.starts_with('{') {
        let event: ProductDeleted = serde_json::from_str(trimmed)?;
        if event.media_ids.is_empty() {
            return Ok(ProductDeletedPayload::ByProductId(event.id));
        }
        return Ok(ProductDeletedPayload::ByMediaIds {
            product_id: event.id,
            media_ids: event.media_ids,
        });
    }

    // Legacy form: the payload is the product id itself.
    Uuid::parse_str(trimmed)
        .map(ProductDeletedPayload::ByProductId)
        .map_err(|e| AppError::MalformedEvent(format!("bad product id '{}': {}", trimmed, e)))
}

pub fn parse_user_deleted(payload: &str) -> Result<Uuid, AppError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(AppError::MalformedEvent("empty user.deleted payload".into()));
    }

    if trimmed.starts_with('{') {
        let event: UserDeleted = serde_json::from_str(trimmed)?;
        return Ok(event.id);
    }

    Uuid::parse_str(trimmed)
        .map_err(|e| AppError::MalformedEvent(format!("bad user id '{}': {}", trimmed, e)))
}
