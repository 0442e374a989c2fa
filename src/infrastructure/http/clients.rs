use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::errors::AppError;

/// Outcome of an existence probe. Timeouts, 5xx and transport failures are
/// indeterminate: the reconciler must keep the reference rather than prune
/// on a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaProbe {
    Present,
    Absent,
    Indeterminate,
}

/// Calls the product service exposes to the media service.
#[automock]
#[async_trait]
pub trait ProductServiceApi: Send + Sync {
    /// `DELETE /products/{product_id}/remove-media/{media_id}`. Best-effort
    /// from the caller's perspective.
    async fn remove_media(&self, product_id: Uuid, media_id: Uuid) -> Result<(), AppError>;
}

/// Calls the media service exposes to the product service.
#[automock]
#[async_trait]
pub trait MediaServiceApi: Send + Sync {
    /// `PUT /media/{media_id}/product/{product_id}` — stamp the
    /// back-reference. Best-effort from the caller's perspective.
    async fn stamp_product(&self, media_id: Uuid, product_id: Uuid) -> Result<(), AppError>;

    /// `HEAD /media/{media_id}` — lightweight existence probe.
    async fn probe(&self, media_id: Uuid) -> MediaProbe;
}

#[derive(Clone)]
pub struct HttpProductServiceClient {
    client: Client,
    base_url: String,
}

impl HttpProductServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpProductServiceClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductServiceApi for HttpProductServiceClient {
    async fn remove_media(&self, product_id: Uuid, media_id: Uuid) -> Result<(), AppError> {
        let url = format!(
            "{}/products/{}/remove-media/{}",
            self.base_url, product_id, media_id
        );
        let response = self.client.delete(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::TransientDependency(format!(
                "remove-media callback returned {}",
                response.status()
            )))
        }
    }
}

#[derive(Clone)]
pub struct HttpMediaServiceClient {
    client: Client,
    base_url: String,
}

impl HttpMediaServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpMediaServiceClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaServiceApi for HttpMediaServiceClient {
    async fn stamp_product(&self, media_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let url = format!("{}/media/{}/product/{}", self.base_url, media_id, product_id);
        let response = self.client.put(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::TransientDependency(format!(
                "back-reference stamp returned {}",
                response.status()
            )))
        }
    }

    async fn probe(&self, media_id: Uuid) -> MediaProbe {
        let url = format!("{}/media/{}", self.base_url, media_id);

        match self.client.head(&url).send().await {
            Ok(response) => match response.status() {
                StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => MediaProbe::Absent,
                status if status.is_success() => MediaProbe::Present,
                status => {
                    tracing::warn!("Probe for media {} returned {}", media_id, status);
                    MediaProbe::Indeterminate
                }
            },
            Err(e) => {
                tracing::warn!("Probe for media {} failed: {}", media_id, e);
                MediaProbe::Indeterminate
            }
        }
    }
}
