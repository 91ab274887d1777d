//! Object storage adapter for photo assets.
//!
//! Uploads are keyed `{owner}/{millis}-{filename}` so each user's photos
//! live under their own prefix and names never collide.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::gateway::Gateway;
use crate::gateway::GatewayError;
use crate::gateway::OutboundRequest;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("asset store returned status {status}")]
    Status { status: u16 },

    #[error("not an asset URL: {0}")]
    BadUrl(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    gateway: Gateway,
    base: String,
}

impl AssetStore {
    pub fn new(gateway: Gateway, base: impl Into<String>) -> Self {
        Self {
            gateway,
            base: base.into(),
        }
    }

    /// Uploads a binary asset and returns its public URL.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        owner_id: &str,
        filename: &str,
    ) -> Result<String, AssetError> {
        let name = format!("{owner_id}/{}-{filename}", Utc::now().timestamp_millis());
        let url = format!("{}/{name}", self.base);

        let response = self
            .gateway
            .send(OutboundRequest::post_bytes(url, bytes, "image/jpeg"))
            .await?;
        if !response.is_success() {
            return Err(AssetError::Status {
                status: response.status.as_u16(),
            });
        }

        let uploaded: UploadResponse = response.json()?;
        Ok(uploaded.url)
    }

    /// Deletes an object by its storage path (no leading slash).
    pub async fn delete(&self, path: &str) -> Result<(), AssetError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));

        let response = self.gateway.send(OutboundRequest::delete(url)).await?;
        if !response.is_success() {
            return Err(AssetError::Status {
                status: response.status.as_u16(),
            });
        }
        Ok(())
    }

    /// Recovers the storage path from a public asset URL.
    pub fn object_path(&self, public_url: &str) -> Result<String, AssetError> {
        let parsed =
            Url::parse(public_url).map_err(|_| AssetError::BadUrl(public_url.to_string()))?;
        let path = parsed.path().trim_start_matches('/');
        if path.is_empty() {
            return Err(AssetError::BadUrl(public_url.to_string()));
        }
        Ok(path.to_string())
    }
}
