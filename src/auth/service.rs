/// Account flows: register, login, logout, password change, account and
/// media updates. Each flow validates everything before its first store
/// write.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwt::{TokenIssuer, TokenPair};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::rotate_refresh_token;
use crate::error::{AppError, AuthError, StoreError, UploadError, ValidationError};
use crate::identity::{AccountUpdate, MediaSlot, NewIdentity, PublicIdentity};
use crate::media::ObjectStore;
use crate::store::UserStore;
use crate::validators::{
    is_valid_display_name, is_valid_email, is_valid_username, require,
    validate_password_strength,
};

#[derive(Debug, Default)]
pub struct RegisterInput {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default)]
pub struct LoginInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: PublicIdentity,
    pub tokens: TokenPair,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    objects: Arc<dyn ObjectStore>,
    issuer: TokenIssuer,
    password_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        objects: Arc<dyn ObjectStore>,
        issuer: TokenIssuer,
        password_cost: u32,
    ) -> Self {
        Self {
            store,
            objects,
            issuer,
            password_cost,
        }
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn register(&self, input: RegisterInput) -> Result<PublicIdentity, AppError> {
        let fullname = require(input.fullname.as_deref(), "fullname")?;
        let email = require(input.email.as_deref(), "email")?;
        let username = require(input.username.as_deref(), "username")?;
        // presence only; the password itself is hashed untrimmed
        require(input.password.as_deref(), "password")?;
        let password = input.password.as_deref().unwrap_or_default();

        let display_name = is_valid_display_name(fullname)?;
        let email = is_valid_email(email)?;
        let username = is_valid_username(username)?;
        validate_password_strength(password)?;

        if self
            .store
            .find_by_username_or_email(Some(username.as_str()), Some(email.as_str()))
            .await?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("{} / {}", username, email)).into());
        }

        let password_hash = hash_password(password, self.password_cost)?;
        let identity = self
            .store
            .create(NewIdentity {
                username,
                email,
                display_name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %identity.id, "Identity registered");
        Ok(identity.to_public())
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, AppError> {
        let username = input
            .username
            .as_deref()
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());
        let email = input
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        if username.is_none() && email.is_none() {
            return Err(
                ValidationError::Rule("username or email is required".to_string()).into(),
            );
        }
        require(input.password.as_deref(), "password")?;
        let password = input.password.as_deref().unwrap_or_default();

        let identity = self
            .store
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !verify_password(password, &identity.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.issuer.issue_pair(&identity)?;
        self.store
            .set_refresh_token(identity.id, Some(tokens.refresh_token.as_str()))
            .await?;

        let user = self
            .store
            .find_by_id(identity.id)
            .await?
            .ok_or_else(|| AppError::Internal("identity vanished during login".to_string()))?
            .to_public();

        tracing::info!(user_id = %user.id, "Identity logged in");
        Ok(LoginOutcome { user, tokens })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.set_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "Identity logged out");
        Ok(())
    }

    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        rotate_refresh_token(self.store.as_ref(), &self.issuer, incoming).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        require(old_password, "oldPassword")?;
        require(new_password, "newPassword")?;
        let old_password = old_password.unwrap_or_default();
        let new_password = new_password.unwrap_or_default();
        validate_password_strength(new_password)?;

        let identity = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !verify_password(old_password, &identity.password_hash) {
            return Err(AuthError::InvalidOldPassword.into());
        }

        self.set_password(user_id, new_password).await?;
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Hash and store a new password. The only path that writes a password hash.
    pub async fn set_password(&self, user_id: Uuid, plaintext: &str) -> Result<(), AppError> {
        let password_hash = hash_password(plaintext, self.password_cost)?;
        self.store.set_password_hash(user_id, &password_hash).await?;
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: Uuid,
        fullname: Option<&str>,
        email: Option<&str>,
    ) -> Result<PublicIdentity, AppError> {
        let display_name = is_valid_display_name(require(fullname, "fullname")?)?;
        let email = is_valid_email(require(email, "email")?)?;

        let identity = self
            .store
            .update_account(user_id, AccountUpdate { display_name, email })
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        Ok(identity.to_public())
    }

    /// Upload a staged file and record its URL on the identity
    pub async fn replace_media(
        &self,
        user_id: Uuid,
        slot: MediaSlot,
        staged: &Path,
    ) -> Result<PublicIdentity, AppError> {
        let object = self.objects.upload(staged).await.map_err(|e| match e {
            UploadError::MissingFile(_) => UploadError::MissingFile(slot.label().to_string()),
            other => other,
        })?;

        let identity = self
            .store
            .set_media(user_id, slot, &object.url)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        tracing::info!(user_id = %user_id, slot = slot.label(), "Media replaced");
        Ok(identity.to_public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use crate::media::LocalObjectStore;
    use crate::store::InMemoryUserStore;

    fn service() -> (AuthService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        let objects = Arc::new(LocalObjectStore::new(
            std::env::temp_dir().join(format!("mediashare-svc-{}", Uuid::new_v4())),
            "/media",
        ));
        let issuer = TokenIssuer::new(JwtSettings {
            access_token_secret: "service-access-secret".to_string(),
            access_token_expiry: 60,
            refresh_token_secret: "service-refresh-secret".to_string(),
            refresh_token_expiry: 3600,
            issuer: "test".to_string(),
        });
        (AuthService::new(store.clone(), objects, issuer, 4), store)
    }

    fn alice() -> RegisterInput {
        RegisterInput {
            fullname: Some("Alice".to_string()),
            email: Some("alice@x.com".to_string()),
            username: Some("alice".to_string()),
            password: Some("Secret123".to_string()),
        }
    }

    fn login_as(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: Some(username.to_string()),
            email: None,
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn register_normalizes_and_hashes() {
        let (service, store) = service();
        let mut input = alice();
        input.username = Some("  ALICE ".to_string());
        input.email = Some("Alice@X.com".to_string());

        let user = service.register(input).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Secret123");
        assert!(verify_password("Secret123", &stored.password_hash));
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();

        let mut same_email = alice();
        same_email.username = Some("alice2".to_string());
        let err = service.register(same_email).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn register_requires_every_field() {
        let (service, store) = service();
        let mut input = alice();
        input.password = Some("   ".to_string());

        let err = service.register(input).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptyField(ref f)) if f == "password"
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn login_then_gate_resolves_same_identity() {
        let (service, store) = service();
        let registered = service.register(alice()).await.unwrap();

        let outcome = service.login(login_as("alice", "Secret123")).await.unwrap();
        assert_eq!(outcome.user.id, registered.id);

        let stored = store.find_by_id(registered.id).await.unwrap().unwrap();
        assert_eq!(
            stored.refresh_token.as_deref(),
            Some(outcome.tokens.refresh_token.as_str())
        );

        let gated = crate::auth::gate::authenticate(
            service.store(),
            service.issuer(),
            Some(outcome.tokens.access_token.as_str()),
        )
        .await
        .unwrap();
        assert_eq!(gated.id, registered.id);
    }

    #[tokio::test]
    async fn login_by_email_is_case_insensitive() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();

        let outcome = service
            .login(LoginInput {
                username: None,
                email: Some("ALICE@x.com".to_string()),
                password: Some("Secret123".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(outcome.user.username, "alice");
    }

    #[tokio::test]
    async fn login_failures() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();

        let wrong = service.login(login_as("alice", "Wrong123")).await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(AuthError::InvalidCredentials)));

        let unknown = service.login(login_as("bob", "Secret123")).await.unwrap_err();
        assert!(matches!(unknown, AppError::NotFound(_)));

        let nothing = service.login(LoginInput::default()).await.unwrap_err();
        assert!(matches!(nothing, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn new_login_invalidates_previous_session() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();

        let first = service.login(login_as("alice", "Secret123")).await.unwrap();
        service.login(login_as("alice", "Secret123")).await.unwrap();

        let err = service
            .refresh(Some(first.tokens.refresh_token.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenReused)));
    }

    #[tokio::test]
    async fn logout_blocks_refresh() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();
        let outcome = service.login(login_as("alice", "Secret123")).await.unwrap();

        service.logout(outcome.user.id).await.unwrap();

        let err = service
            .refresh(Some(outcome.tokens.refresh_token.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::RefreshTokenReused)));
    }

    #[tokio::test]
    async fn change_password_with_wrong_old_password_writes_nothing() {
        let (service, store) = service();
        let user = service.register(alice()).await.unwrap();
        let before = store.find_by_id(user.id).await.unwrap().unwrap().password_hash;

        let err = service
            .change_password(user.id, Some("Wrong123"), Some("Another123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidOldPassword)));

        let after = store.find_by_id(user.id).await.unwrap().unwrap().password_hash;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn change_password_rehashes() {
        let (service, _) = service();
        let user = service.register(alice()).await.unwrap();

        service
            .change_password(user.id, Some("Secret123"), Some("Another123"))
            .await
            .unwrap();

        assert!(service.login(login_as("alice", "Secret123")).await.is_err());
        assert!(service.login(login_as("alice", "Another123")).await.is_ok());
    }

    #[tokio::test]
    async fn account_update_does_not_touch_password() {
        let (service, store) = service();
        let user = service.register(alice()).await.unwrap();
        let before = store.find_by_id(user.id).await.unwrap().unwrap().password_hash;

        let updated = service
            .update_account(user.id, Some("Alice Liddell"), Some("liddell@x.com"))
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Alice Liddell");
        assert_eq!(updated.email, "liddell@x.com");

        let after = store.find_by_id(user.id).await.unwrap().unwrap().password_hash;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn replace_media_reports_missing_file_by_slot() {
        let (service, _) = service();
        let user = service.register(alice()).await.unwrap();

        let err = service
            .replace_media(user.id, MediaSlot::Avatar, Path::new("/no/such/file.png"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Avatar file is missing");
    }
}
