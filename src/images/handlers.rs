use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{ImageResponse, UploadBase64Request};
use super::services;
use crate::auth::jwt::AuthUser;
use crate::auth::services as auth_services;
use crate::error::ApiError;
use crate::remote::RemoteImageDetails;
use crate::state::AppState;

/// Upper bound on upload bodies; matches the remote store's own cap.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images))
        .route("/images/remote/:remote_id", get(get_remote_details))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_multipart))
        .route("/images/base64", post(upload_base64))
        .route("/images/:id", delete(delete_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /images (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_multipart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>), ApiError> {
    let mut bytes: Option<Bytes> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            );
            break;
        }
    }
    let Some(bytes) = bytes else {
        return Err(ApiError::BadRequest(
            "multipart field \"file\" is required".into(),
        ));
    };

    let owner = auth_services::find_account(&state, user_id).await?;
    let record = services::upload(&state, &owner, bytes).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// POST /images/base64 { image_b64: "..." }
#[instrument(skip(state, body))]
pub async fn upload_base64(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UploadBase64Request>,
) -> Result<(StatusCode, Json<ImageResponse>), ApiError> {
    let decoded = BASE64
        .decode(body.image_b64.as_bytes())
        .map_err(|_| ApiError::BadRequest("invalid base64".into()))?;

    let owner = auth_services::find_account(&state, user_id).await?;
    let record = services::upload(&state, &owner, Bytes::from(decoded)).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let records = services::list_by_owner(&state, user_id).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::delete(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_remote_details(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(remote_id): Path<String>,
) -> Result<Json<RemoteImageDetails>, ApiError> {
    let details = services::fetch_remote_details(&state, &remote_id).await?;
    Ok(Json(details))
}
