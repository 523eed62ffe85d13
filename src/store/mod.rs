/// Identity store
///
/// The session store adapter the auth core talks to. Every method is a
/// single-record atomic operation; single-field updates never touch the
/// other fields of the record.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::identity::{AccountUpdate, Identity, MediaSlot, NewIdentity};

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Matches either field. Returns `None` when neither is given.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Identity>, StoreError>;

    /// Fails with `StoreError::Duplicate` if username or email is taken
    async fn create(&self, draft: NewIdentity) -> Result<Identity, StoreError>;

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), StoreError>;

    /// Replace the stored refresh token only if it still equals `expected`.
    /// Returns whether the swap happened.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, StoreError>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    /// Fails with `StoreError::Duplicate` if the new email belongs to someone else
    async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Option<Identity>, StoreError>;

    async fn set_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<Option<Identity>, StoreError>;
}
