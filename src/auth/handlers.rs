use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest};
use super::jwt::JwtKeys;
use super::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:username", get(get_profile))
}

/// Registration hands back the created profile only; tokens are issued
/// by a subsequent login.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = services::authenticate(&state, &payload.username, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::InvalidToken)?;

    // A token whose subject no longer exists is as good as expired.
    let user = services::find_account(&state, claims.sub)
        .await
        .map_err(|_| ApiError::InvalidToken)?;

    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::lookup(&state, &username).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod profile_tests {
    use super::*;
    use crate::store::UserRecord;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn password_hash_never_serializes() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: "Test".into(),
            username: "test".into(),
            email: "test@example.com".into(),
            password_hash: "argon2-secret-material".into(),
            created_at: OffsetDateTime::now_utc(),
        };

        let raw = serde_json::to_string(&record).unwrap();
        assert!(!raw.contains("argon2-secret-material"));

        let public = serde_json::to_string(&PublicUser::from(record)).unwrap();
        assert!(!public.contains("argon2-secret-material"));
        assert!(public.contains("test@example.com"));
    }
}
