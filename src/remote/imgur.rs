use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

use super::{MediaStore, RemoteError, RemoteImage, RemoteImageDetails};
use crate::config::MediaConfig;

/// Client for an Imgur-compatible media API: anonymous uploads authorized by
/// a fixed client credential carried on every request. No retries; a bounded
/// timeout on the underlying client turns hangs into transport errors.
#[derive(Clone)]
pub struct ImgurClient {
    http: Client,
    base_url: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    id: String,
    link: String,
}

#[derive(Debug, Deserialize)]
struct DetailsData {
    id: String,
    link: String,
    title: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    size: Option<u64>,
}

impl ImgurClient {
    pub fn new(config: &MediaConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
        })
    }

    fn auth_value(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }

    fn image_url(&self, remote_id: &str) -> String {
        format!("{}/3/image/{}", self.base_url, remote_id)
    }

    async fn status_error(response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteError::Status { status, body }
    }
}

#[async_trait]
impl MediaStore for ImgurClient {
    #[instrument(skip(self, bytes), fields(payload_len = bytes.len()))]
    async fn put(&self, bytes: Bytes) -> Result<RemoteImage, RemoteError> {
        let body = json!({ "image": BASE64.encode(&bytes) });
        let response = self
            .http
            .post(format!("{}/3/image", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_value())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "upload request to remote store failed");
                RemoteError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let err = Self::status_error(response).await;
            error!(error = %err, "remote store rejected upload");
            return Err(err);
        }

        let envelope: Envelope<UploadData> = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        // A record is never persisted with a blank remote id, so a success
        // body missing either field counts as malformed.
        if envelope.data.id.is_empty() || envelope.data.link.is_empty() {
            return Err(RemoteError::MalformedResponse(
                "upload response carried a blank id or link".to_string(),
            ));
        }

        debug!(remote_id = %envelope.data.id, "image stored remotely");
        Ok(RemoteImage {
            remote_id: envelope.data.id,
            url: envelope.data.link,
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, remote_id: &str) -> Result<RemoteImageDetails, RemoteError> {
        let response = self
            .http
            .get(self.image_url(remote_id))
            .header(reqwest::header::AUTHORIZATION, self.auth_value())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "details request to remote store failed");
                RemoteError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let envelope: Envelope<DetailsData> = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        let data = envelope.data;
        debug!(remote_id = %data.id, "fetched remote image details");
        Ok(RemoteImageDetails {
            remote_id: data.id,
            url: data.link,
            title: data.title,
            mime_type: data.mime_type,
            width: data.width,
            height: data.height,
            size: data.size,
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, remote_id: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.image_url(remote_id))
            .header(reqwest::header::AUTHORIZATION, self.auth_value())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "delete request to remote store failed");
                RemoteError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let err = Self::status_error(response).await;
            error!(error = %err, "remote store rejected delete");
            return Err(err);
        }

        debug!(%remote_id, "remote image deleted");
        Ok(())
    }
}
