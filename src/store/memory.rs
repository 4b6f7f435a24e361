use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ImageRecord, ImageStore, StoreError, UserRecord, UserStore};

/// In-memory store with the same constraint semantics as the Postgres
/// implementation: unique usernames, owner-must-exist on image insert, and
/// user-to-image cascade. Backs `AppState::fake()` and the service tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    // Vec keeps insertion order, which is the listing order.
    images: Vec<ImageRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.username == username) {
            return Err(StoreError::Duplicate);
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        inner.images.retain(|img| img.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn insert_image(
        &self,
        user_id: Uuid,
        url: &str,
        remote_id: &str,
    ) -> Result<ImageRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        let image = ImageRecord {
            id: Uuid::new_v4(),
            url: url.to_string(),
            remote_id: remote_id.to_string(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.images.push(image.clone());
        Ok(image)
    }

    async fn list_images_by_owner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ImageRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .images
            .iter()
            .filter(|img| img.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_image_owned(
        &self,
        user_id: Uuid,
        image_id: Uuid,
    ) -> Result<Option<ImageRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .images
            .iter()
            .find(|img| img.id == image_id && img.user_id == user_id)
            .cloned())
    }

    async fn delete_image(&self, image_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.images.len();
        inner.images.retain(|img| img.id != image_id);
        Ok(inner.images.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn username_uniqueness_is_enforced_at_write_time() {
        let store = MemoryStore::default();
        store
            .insert_user("Ada", "ada", "ada@example.com", "hash-a")
            .await
            .expect("first insert");
        let err = store
            .insert_user("Other Ada", "ada", "other@example.com", "hash-b")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn image_requires_existing_owner() {
        let store = MemoryStore::default();
        let err = store
            .insert_image(Uuid::new_v4(), "https://x/1", "r1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_their_images() {
        let store = MemoryStore::default();
        let ada = store
            .insert_user("Ada", "ada", "ada@example.com", "hash")
            .await
            .unwrap();
        let bob = store
            .insert_user("Bob", "bob", "bob@example.com", "hash")
            .await
            .unwrap();
        store.insert_image(ada.id, "https://x/1", "r1").await.unwrap();
        store.insert_image(ada.id, "https://x/2", "r2").await.unwrap();
        store.insert_image(bob.id, "https://x/3", "r3").await.unwrap();

        store.delete_user(ada.id).await.unwrap();

        assert!(store.find_user_by_id(ada.id).await.unwrap().is_none());
        assert!(store.list_images_by_owner(ada.id).await.unwrap().is_empty());
        assert_eq!(store.list_images_by_owner(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() {
        let store = MemoryStore::default();
        let ada = store
            .insert_user("Ada", "ada", "ada@example.com", "hash")
            .await
            .unwrap();
        for n in 1..=3 {
            store
                .insert_image(ada.id, &format!("https://x/{n}"), &format!("r{n}"))
                .await
                .unwrap();
        }
        let urls: Vec<String> = store
            .list_images_by_owner(ada.id)
            .await
            .unwrap()
            .into_iter()
            .map(|img| img.url)
            .collect();
        assert_eq!(urls, vec!["https://x/1", "https://x/2", "https://x/3"]);
    }
}
