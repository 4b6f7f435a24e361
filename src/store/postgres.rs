use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ImageRecord, ImageStore, StoreError, UserRecord, UserStore};

/// sqlx-backed store. Username uniqueness comes from the UNIQUE constraint
/// on `users.username`; the user-to-image cascade from the foreign key on
/// `images.user_id`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        // 23505 unique_violation, 23503 foreign_key_violation
        match db.code().as_deref() {
            Some("23505") => return StoreError::Duplicate,
            Some("23503") => return StoreError::NotFound,
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStore for PgStore {
    async fn insert_image(
        &self,
        user_id: Uuid,
        url: &str,
        remote_id: &str,
    ) -> Result<ImageRecord, StoreError> {
        let image = sqlx::query_as::<_, ImageRecord>(
            r#"
            INSERT INTO images (url, remote_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, url, remote_id, user_id, created_at
            "#,
        )
        .bind(url)
        .bind(remote_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(image)
    }

    async fn list_images_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ImageRecord>, StoreError> {
        let images = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, url, remote_id, user_id, created_at
            FROM images
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn find_image_owned(
        &self,
        user_id: Uuid,
        image_id: Uuid,
    ) -> Result<Option<ImageRecord>, StoreError> {
        let image = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, url, remote_id, user_id, created_at
            FROM images
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(image_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn delete_image(&self, image_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(image_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
