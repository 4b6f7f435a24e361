use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::auth::services::AuthError;
use crate::images::services::SyncError;
use crate::remote::RemoteError;
use crate::store::StoreError;

/// Boundary error for every handler. Domain errors convert into it with
/// `?`; the `IntoResponse` impl decides the status code and how much
/// detail leaves the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// JSON error payload shape shared by every failure response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Auth(AuthError::Validation(_))
            | ApiError::Sync(SyncError::Validation(_))
            | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", self.to_string())
            }
            ApiError::Auth(AuthError::UsernameTaken)
            | ApiError::Auth(AuthError::Store(StoreError::Duplicate))
            | ApiError::Sync(SyncError::Store(StoreError::Duplicate))
            | ApiError::Store(StoreError::Duplicate) => {
                (StatusCode::CONFLICT, "Conflict", self.to_string())
            }
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationFailed",
                self.to_string(),
            ),
            ApiError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "InvalidToken", self.to_string())
            }
            ApiError::Auth(AuthError::UserNotFound)
            | ApiError::Sync(SyncError::NotFound)
            | ApiError::Sync(SyncError::Store(StoreError::NotFound))
            | ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string())
            }
            ApiError::Sync(SyncError::RemoteWrite(_))
            | ApiError::Sync(SyncError::RemoteDelete(_))
            | ApiError::Sync(SyncError::RemoteDetails(_))
            | ApiError::Remote(_) => (
                StatusCode::BAD_GATEWAY,
                "RemoteStoreFailure",
                self.to_string(),
            ),
            // Remote committed, local did not. Not masked like other
            // 500s; the message carries the remote id.
            ApiError::Sync(SyncError::LocalWrite { .. })
            | ApiError::Sync(SyncError::LocalDelete { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "LocalStoreFailure",
                self.to_string(),
            ),
            ApiError::Auth(_) | ApiError::Sync(_) | ApiError::Store(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                // Don't leak details
                "internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), code, detail = %self, "request failed");
        }

        (
            status,
            Json(ErrorBody {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(resp: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_bad_request() {
        let resp = ApiError::from(AuthError::Validation("invalid email".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_of(resp).await;
        assert_eq!(body.error, "InvalidRequest");
        assert_eq!(body.message, "invalid email");
    }

    #[tokio::test]
    async fn remote_failure_carries_upstream_status_in_message() {
        let resp = ApiError::from(SyncError::RemoteWrite(RemoteError::Status {
            status: 403,
            body: "forbidden".into(),
        }))
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_of(resp).await;
        assert_eq!(body.error, "RemoteStoreFailure");
        assert!(body.message.contains("403"));
    }

    #[tokio::test]
    async fn partial_state_failure_names_the_orphaned_remote_object() {
        let resp = ApiError::from(SyncError::LocalWrite {
            remote_id: "r9".into(),
            source: StoreError::NotFound,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert_eq!(body.error, "LocalStoreFailure");
        assert!(body.message.contains("r9"));
    }

    #[tokio::test]
    async fn plain_database_errors_are_masked() {
        let resp = ApiError::from(StoreError::Database(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert_eq!(body.error, "InternalServerError");
        assert_eq!(body.message, "internal server error");
    }
}
