use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Product document. `media_ids` is the authoritative side of the
/// product-media association: ordered, duplicates tolerated. The eventual
/// invariant that every listed id resolves to a live media row is restored
/// by the deletion consumer, the removal callback, or the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub media_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(user_id: Uuid, request: &ProductRequest) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            user_id,
            name: request.name.clone(),
            description: request.description.clone(),
            price: request.price,
            quantity: request.quantity,
            media_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 120, message = "Must be 1-120 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0.0, message = "Must not be negative"))]
    pub price: f64,

    #[validate(range(min = 0, message = "Must not be negative"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i32,
    pub media_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id,
            seller_id: product.user_id,
            name: product.name,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            media_ids: product.media_ids,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Result of one reconciler sweep.
#[derive(Debug, Default, Serialize)]
pub struct CleanupSummary {
    pub products_checked: usize,
    pub products_repaired: usize,
    pub references_removed: usize,
}

impl CleanupSummary {
    pub fn message(&self) -> String {
        format!(
            "Cleaned up {} orphaned media references from products",
            self.references_removed
        )
    }
}
