use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::RegisterRequest;
use super::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::store::{StoreError, UserRecord};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register(st: &AppState, req: RegisterRequest) -> Result<UserRecord, AuthError> {
    let name = req.name.trim();
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() || username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AuthError::Validation("all fields are required".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AuthError::Validation("invalid email".into()));
    }
    if req.password.len() < 8 {
        warn!("password too short");
        return Err(AuthError::Validation("password too short".into()));
    }

    // Fast path for a readable error; the unique constraint in the store
    // is what actually holds against a concurrent registration.
    if st.store.find_user_by_username(username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(AuthError::UsernameTaken);
    }

    let hash = hash_password(&req.password).map_err(|e| AuthError::Hash(e.to_string()))?;

    let user = match st.store.insert_user(name, username, &email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!(%username, "username taken at write time");
            return Err(AuthError::UsernameTaken);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Unknown username and wrong password collapse into the same error.
/// Only the log line tells the two branches apart.
pub async fn authenticate(
    st: &AppState,
    username: &str,
    password: &str,
) -> Result<UserRecord, AuthError> {
    let username = username.trim();
    let user = match st.store.find_user_by_username(username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login for unknown username");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let ok = verify_password(password, &user.password_hash)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    if !ok {
        warn!(%username, user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, %username, "user authenticated");
    Ok(user)
}

pub async fn lookup(st: &AppState, username: &str) -> Result<UserRecord, AuthError> {
    st.store
        .find_user_by_username(username.trim())
        .await?
        .ok_or(AuthError::UserNotFound)
}

pub async fn find_account(st: &AppState, user_id: Uuid) -> Result<UserRecord, AuthError> {
    st.store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)
}

/// Deletes the account and, through the store's cascade, every image
/// record it owns. Remote objects are left in place; there is no bulk
/// remote cleanup. Not routed over HTTP today.
pub async fn remove_account(st: &AppState, user_id: Uuid) -> Result<(), AuthError> {
    match st.store.delete_user(user_id).await {
        Ok(()) => {
            info!(%user_id, "account removed");
            Ok(())
        }
        Err(StoreError::NotFound) => Err(AuthError::UserNotFound),
        Err(e) => Err(e.into()),
    }
}
