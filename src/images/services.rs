use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::remote::{RemoteError, RemoteImageDetails};
use crate::state::AppState;
use crate::store::{ImageRecord, StoreError, UserRecord};

/// Failures of the two-step remote/local sequences. The `Local*` variants
/// mean the remote side already committed; their messages and the WARN
/// logs emitted alongside them carry the remote id so the leftover state
/// can be found later.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),
    #[error("image not found")]
    NotFound,
    #[error("remote store rejected the upload: {0}")]
    RemoteWrite(RemoteError),
    #[error("image stored remotely as {remote_id} but the local record failed: {source}")]
    LocalWrite { remote_id: String, source: StoreError },
    #[error("remote store rejected the delete: {0}")]
    RemoteDelete(RemoteError),
    #[error("remote image {remote_id} deleted but the local record remains: {source}")]
    LocalDelete { remote_id: String, source: StoreError },
    #[error("remote store could not serve image details: {0}")]
    RemoteDetails(RemoteError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Upload: remote store first, local ownership record second. A failure
/// in step 1 leaves no state anywhere; a failure in step 2 orphans the
/// remote object, which is logged before the error returns.
pub async fn upload(
    st: &AppState,
    owner: &UserRecord,
    bytes: Bytes,
) -> Result<ImageRecord, SyncError> {
    if bytes.is_empty() {
        return Err(SyncError::Validation("empty image payload".into()));
    }

    let receipt = st.remote.put(bytes).await.map_err(SyncError::RemoteWrite)?;

    match st
        .store
        .insert_image(owner.id, &receipt.url, &receipt.remote_id)
        .await
    {
        Ok(record) => {
            info!(
                image_id = %record.id,
                remote_id = %record.remote_id,
                owner = %owner.id,
                "image uploaded"
            );
            Ok(record)
        }
        Err(source) => {
            warn!(
                remote_id = %receipt.remote_id,
                url = %receipt.url,
                owner = %owner.id,
                error = %source,
                "remote upload committed but local record failed; remote object is orphaned"
            );
            Err(SyncError::LocalWrite {
                remote_id: receipt.remote_id,
                source,
            })
        }
    }
}

pub async fn list_by_owner(st: &AppState, owner_id: Uuid) -> Result<Vec<ImageRecord>, SyncError> {
    Ok(st.store.list_images_by_owner(owner_id).await?)
}

/// Delete: ownership filter first, then remote removal, then the local
/// record. An id that is absent or owned by someone else never reaches
/// the remote store.
pub async fn delete(st: &AppState, owner_id: Uuid, image_id: Uuid) -> Result<(), SyncError> {
    let record = st
        .store
        .find_image_owned(owner_id, image_id)
        .await?
        .ok_or(SyncError::NotFound)?;

    // On failure here the local record stays and both sides still agree.
    st.remote
        .remove(&record.remote_id)
        .await
        .map_err(SyncError::RemoteDelete)?;

    match st.store.delete_image(image_id).await {
        Ok(true) => {
            info!(%image_id, remote_id = %record.remote_id, owner = %owner_id, "image deleted");
            Ok(())
        }
        // A concurrent delete won the race for the row. Both sides agree
        // the image is gone, so this still counts as success.
        Ok(false) => {
            debug!(%image_id, "local record was already gone");
            Ok(())
        }
        Err(source) => {
            warn!(
                %image_id,
                remote_id = %record.remote_id,
                url = %record.url,
                error = %source,
                "remote image deleted but local record removal failed; record is dangling"
            );
            Err(SyncError::LocalDelete {
                remote_id: record.remote_id,
                source,
            })
        }
    }
}

/// Pass-through to the remote store; no local state is consulted.
pub async fn fetch_remote_details(
    st: &AppState,
    remote_id: &str,
) -> Result<RemoteImageDetails, SyncError> {
    if remote_id.trim().is_empty() {
        return Err(SyncError::Validation("remote id is required".into()));
    }
    st.remote
        .get(remote_id)
        .await
        .map_err(SyncError::RemoteDetails)
}
