use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User record as persisted in the local store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, never exposed in JSON
    pub created_at: OffsetDateTime,
}

/// Local ownership record for an image whose bytes live in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageRecord {
    pub id: Uuid,
    pub url: String,
    pub remote_id: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. For users this is the
    /// write-time backstop behind the service's read-then-check of the
    /// username.
    #[error("record already exists")]
    Duplicate,
    /// The keyed record (or a record it references) does not exist.
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Keyed persistence of user identities. Username uniqueness is enforced
/// here, at write time, regardless of any check the caller already did.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;

    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Remove the user and, by cascade, every image they own.
    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Keyed persistence of image ownership records.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] when the owning user does not
    /// exist; an image is never created without an owner.
    async fn insert_image(
        &self,
        user_id: Uuid,
        url: &str,
        remote_id: &str,
    ) -> Result<ImageRecord, StoreError>;

    /// All images owned by `user_id`, in insertion order.
    async fn list_images_by_owner(&self, user_id: Uuid)
        -> Result<Vec<ImageRecord>, StoreError>;

    /// Fetch an image only if it belongs to `user_id`. Absent and
    /// owned-by-someone-else are indistinguishable to the caller.
    async fn find_image_owned(
        &self,
        user_id: Uuid,
        image_id: Uuid,
    ) -> Result<Option<ImageRecord>, StoreError>;

    /// Returns whether a record was actually removed.
    async fn delete_image(&self, image_id: Uuid) -> Result<bool, StoreError>;
}

/// Combined capability carried by the application state.
pub trait Store: UserStore + ImageStore {}

impl<T: UserStore + ImageStore> Store for T {}
