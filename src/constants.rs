use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Consumer group names per logical service. Each group receives its own
/// copy of every event on a subscribed topic.
pub const MEDIA_SERVICE_GROUP: &str = "media-service-group";
pub const PRODUCT_SERVICE_GROUP: &str = "product-service-group";
