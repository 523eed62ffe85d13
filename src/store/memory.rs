use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::error::StoreError;
use crate::identity::{AccountUpdate, Identity, MediaSlot, NewIdentity};

/// Process-local identity store. Each operation holds the lock across its
/// whole read-modify-write.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, Identity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an identity. Tokens issued for it stop passing the gate.
    pub async fn remove(&self, id: Uuid) -> Option<Identity> {
        self.users.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Identity>, StoreError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                username.map_or(false, |name| u.username == name)
                    || email.map_or(false, |mail| u.email == mail)
            })
            .cloned())
    }

    async fn create(&self, draft: NewIdentity) -> Result<Identity, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == draft.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        if users.values().any(|u| u.email == draft.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            username: draft.username,
            email: draft.email,
            display_name: draft.display_name,
            avatar: None,
            cover_image: None,
            password_hash: draft.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = Some(next.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != id && u.email == update.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        Ok(users.get_mut(&id).map(|user| {
            user.display_name = update.display_name;
            user.email = update.email;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.write().await.get_mut(&id).map(|user| {
            match slot {
                MediaSlot::Avatar => user.avatar = Some(url.to_string()),
                MediaSlot::CoverImage => user.cover_image = Some(url.to_string()),
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}
