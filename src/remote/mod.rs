use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod imgur;

pub use imgur::ImgurClient;

/// Upload receipt from the remote store. Between a successful `put` and the
/// local record write this is the only evidence the object exists, so the
/// sync service logs it verbatim whenever the local half fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub remote_id: String,
    pub url: String,
}

/// Metadata the remote store holds for an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteImageDetails {
    pub remote_id: String,
    pub url: String,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote store answered with a non-success status.
    #[error("remote store returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The request never completed: connect failure, timeout, TLS, dropped
    /// connection.
    #[error("remote store unreachable: {0}")]
    Transport(String),
    /// A success status whose body did not match the documented shape.
    #[error("remote store returned an undecodable body: {0}")]
    MalformedResponse(String),
}

/// The remote media store: durably holds image bytes and hands out an opaque
/// identifier plus a public URL. Implementations do not retry; retry policy
/// belongs to callers.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the payload, returning the remote identifier and URL.
    async fn put(&self, bytes: Bytes) -> Result<RemoteImage, RemoteError>;

    /// Fetch metadata for a previously stored identifier.
    async fn get(&self, remote_id: &str) -> Result<RemoteImageDetails, RemoteError>;

    /// Delete the remote object.
    async fn remove(&self, remote_id: &str) -> Result<(), RemoteError>;
}
