//! Registration, login, and credential changes.
//!
//! Orchestrates the credential store, the password hasher and the token
//! issuer. Store failures are passed through untouched as
//! [`AccountError::Store`]; they are never folded into authentication errors.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use foodlabel_core::UserId;

use crate::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, PASSWORD_MAX, PASSWORD_MIN,
    RegisterRequest, USERNAME_MAX, USERNAME_MIN,
};
use crate::{
    CredentialStore, Identity, JwtIssuer, NewIdentity, Role, StoreError, UniqueField,
    UserProfile, password,
};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    /// Unknown username and wrong password look the same from outside.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("current password is incorrect")]
    CurrentPasswordMismatch,

    #[error("user not found")]
    NotFound,

    #[error("`{0}` already exists without the Admin role")]
    SeedConflict(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token issuance failed: {0}")]
    Token(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(UniqueField::Username) => AccountError::DuplicateUsername,
            StoreError::Conflict(UniqueField::Email) => AccountError::DuplicateEmail,
            other => AccountError::Store(other),
        }
    }
}

impl From<password::HashError> for AccountError {
    fn from(e: password::HashError) -> Self {
        AccountError::Hashing(e.to_string())
    }
}

pub struct AccountService<S> {
    store: S,
    tokens: Arc<dyn JwtIssuer>,
}

impl<S> AccountService<S>
where
    S: CredentialStore,
{
    pub fn new(store: S, tokens: Arc<dyn JwtIssuer>) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AccountError> {
        validate_username(&req.username)?;
        validate_password(&req.password)?;
        let email = normalize_optional(req.email);
        if let Some(email) = email.as_deref() {
            validate_email(email)?;
        }

        if self.store.find_by_username(&req.username).await?.is_some() {
            return Err(AccountError::DuplicateUsername);
        }
        if let Some(email) = email.as_deref() {
            if self.store.email_taken(email).await? {
                return Err(AccountError::DuplicateEmail);
            }
        }

        let identity = self
            .store
            .insert(NewIdentity {
                username: req.username,
                password_hash: password::hash(&req.password)?,
                role: Role::user(),
                email,
                first_name: normalize_optional(req.first_name),
                last_name: normalize_optional(req.last_name),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %identity.id, username = %identity.username, "identity registered");
        self.respond(&identity)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AccountError> {
        let Some(identity) = self.store.find_by_username(&req.username).await? else {
            tracing::warn!("login rejected");
            return Err(AccountError::InvalidCredentials);
        };
        if !password::verify(&req.password, &identity.password_hash) {
            tracing::warn!(user_id = %identity.id, "login rejected");
            return Err(AccountError::InvalidCredentials);
        }

        // Timestamp only; the stored hash may have changed since it was read.
        let at = Utc::now();
        self.store.record_login(identity.id, at).await?;
        let identity = Identity {
            last_login_at: Some(at),
            ..identity
        };

        tracing::info!(user_id = %identity.id, "login succeeded");
        self.respond(&identity)
    }

    pub async fn change_password(
        &self,
        user_id: UserId,
        req: ChangePasswordRequest,
    ) -> Result<(), AccountError> {
        let mut identity = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        if !password::verify(&req.current_password, &identity.password_hash) {
            return Err(AccountError::CurrentPasswordMismatch);
        }
        validate_password(&req.new_password)?;

        identity.password_hash = password::hash(&req.new_password)?;
        self.store.update(&identity).await?;

        tracing::info!(user_id = %identity.id, "password changed");
        Ok(())
    }

    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, AccountError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(|i| i.profile())
            .ok_or(AccountError::NotFound)
    }

    /// Ensure an `Admin` identity exists. An existing admin with that username
    /// is returned as-is; a non-admin holder of the username is an error.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<Identity, AccountError> {
        if let Some(existing) = self.store.find_by_username(username).await? {
            if existing.role != Role::admin() {
                tracing::warn!(user_id = %existing.id, role = %existing.role, "admin seed username taken by non-admin");
                return Err(AccountError::SeedConflict(existing.username));
            }
            return Ok(existing);
        }
        validate_password(password)?;

        let identity = self
            .store
            .insert(NewIdentity {
                username: username.to_string(),
                password_hash: password::hash(password)?,
                role: Role::admin(),
                email: None,
                first_name: None,
                last_name: None,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(user_id = %identity.id, username = %identity.username, "admin identity seeded");
        Ok(identity)
    }

    fn respond(&self, identity: &Identity) -> Result<AuthResponse, AccountError> {
        let token = self
            .tokens
            .issue(&identity.summary(), Utc::now())
            .map_err(|e| AccountError::Token(e.to_string()))?;
        Ok(AuthResponse {
            username: identity.username.clone(),
            role: identity.role.clone(),
            token,
            user: identity.profile(),
        })
    }
}

fn validate_username(username: &str) -> Result<(), AccountError> {
    let len = username.chars().count();
    if username.trim().is_empty() || !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AccountError::Validation(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(AccountError::Validation(format!(
            "password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AccountError::Validation("invalid email format".to_string())),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hs256Jwt, InMemoryCredentialStore, TokenConfig};
    use async_trait::async_trait;
    use chrono::DateTime;

    fn jwt() -> Arc<Hs256Jwt> {
        Arc::new(Hs256Jwt::new(TokenConfig::new("service-secret")))
    }

    fn service(jwt: Arc<Hs256Jwt>) -> AccountService<InMemoryCredentialStore> {
        AccountService::new(InMemoryCredentialStore::new(), jwt)
    }

    #[tokio::test]
    async fn register_then_login_scenario() {
        let jwt = jwt();
        let svc = service(jwt.clone());

        let registered = svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap();
        assert_eq!(registered.username, "alice");
        assert_eq!(registered.role, Role::user());

        let logged_in = svc.login(LoginRequest::new("alice", "Secret1")).await.unwrap();

        for token in [&registered.token, &logged_in.token] {
            let claims = jwt.verify(token).unwrap();
            assert_eq!(claims.name, "alice");
        }

        let err = svc.login(LoginRequest::new("alice", "WrongPass")).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let svc = service(jwt());
        svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap();

        let unknown = svc.login(LoginRequest::new("mallory", "Secret1")).await.unwrap_err();
        let wrong = svc.login(LoginRequest::new("alice", "Secret2")).await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn duplicate_registration_leaves_first_identity_intact() {
        let svc = service(jwt());
        let first = svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap();

        let err = svc.register(RegisterRequest::new("alice", "Other99")).await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateUsername));

        let stored = svc.store().find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.user.id);
        assert!(password::verify("Secret1", &stored.password_hash));
        assert!(!password::verify("Other99", &stored.password_hash));
    }

    #[tokio::test]
    async fn stored_hash_is_never_the_plaintext() {
        let svc = service(jwt());
        svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap();
        let stored = svc.store().find_by_username("alice").await.unwrap().unwrap();
        assert!(!stored.password_hash.is_empty());
        assert_ne!(stored.password_hash, "Secret1");
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let svc = service(jwt());
        for req in [
            RegisterRequest::new("al", "Secret1"),
            RegisterRequest::new("alice", "short"),
            RegisterRequest::new("x".repeat(51), "Secret1"),
            RegisterRequest {
                email: Some("no-at-sign".to_string()),
                ..RegisterRequest::new("alice", "Secret1")
            },
        ] {
            let err = svc.register(req).await.unwrap_err();
            assert!(matches!(err, AccountError::Validation(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn profile_fields_and_email_uniqueness() {
        let svc = service(jwt());
        let resp = svc
            .register(RegisterRequest {
                email: Some(" alice@example.com ".to_string()),
                first_name: Some("Alice".to_string()),
                last_name: Some("  ".to_string()),
                ..RegisterRequest::new("alice", "Secret1")
            })
            .await
            .unwrap();
        assert_eq!(resp.user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(resp.user.first_name.as_deref(), Some("Alice"));
        assert_eq!(resp.user.last_name, None);

        let err = svc
            .register(RegisterRequest {
                email: Some("ALICE@example.com".to_string()),
                ..RegisterRequest::new("alice2", "Secret1")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::DuplicateEmail));
    }

    #[tokio::test]
    async fn login_records_last_login() {
        let svc = service(jwt());
        let reg = svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap();
        assert!(reg.user.last_login_at.is_none());

        let login = svc.login(LoginRequest::new("alice", "Secret1")).await.unwrap();
        assert!(login.user.last_login_at.is_some());
        assert!(svc.profile(reg.user.id).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let svc = service(jwt());
        let id = svc.register(RegisterRequest::new("alice", "Secret1")).await.unwrap().user.id;

        let err = svc
            .change_password(
                id,
                ChangePasswordRequest {
                    current_password: "nope-nope".to_string(),
                    new_password: "Secret2".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::CurrentPasswordMismatch));

        svc.change_password(
            id,
            ChangePasswordRequest {
                current_password: "Secret1".to_string(),
                new_password: "Secret2".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(svc.login(LoginRequest::new("alice", "Secret1")).await.is_err());
        assert!(svc.login(LoginRequest::new("alice", "Secret2")).await.is_ok());
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let jwt = jwt();
        let svc = service(jwt.clone());
        let first = svc.seed_admin("admin", "Admin@123").await.unwrap();
        let second = svc.seed_admin("admin", "ignored-pw").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::admin());

        let resp = svc.login(LoginRequest::new("admin", "Admin@123")).await.unwrap();
        let claims = jwt.verify(&resp.token).unwrap();
        assert_eq!(claims.roles(), &[Role::admin()]);
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_by_username(&self, _: &str) -> Result<Option<Identity>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        async fn find_by_id(&self, _: UserId) -> Result<Option<Identity>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        async fn email_taken(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        async fn insert(&self, _: NewIdentity) -> Result<Identity, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        async fn update(&self, _: &Identity) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
        async fn record_login(&self, _: UserId, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failures_are_not_masked_as_auth_failures() {
        let svc = AccountService::new(BrokenStore, jwt());
        let err = svc.login(LoginRequest::new("alice", "Secret1")).await.unwrap_err();
        assert!(matches!(err, AccountError::Store(StoreError::Backend(_))));
    }

    /// Holds `record_login` until released, so a password change can land mid-login.
    struct PausedLoginStore {
        inner: InMemoryCredentialStore,
        reached: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl CredentialStore for PausedLoginStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
            self.inner.find_by_username(username).await
        }
        async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
            self.inner.email_taken(email).await
        }
        async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
            self.inner.insert(identity).await
        }
        async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
            self.inner.update(identity).await
        }
        async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
            self.reached.notify_one();
            self.release.notified().await;
            self.inner.record_login(id, at).await
        }
    }

    #[tokio::test]
    async fn login_in_flight_does_not_undo_a_password_change() {
        let store = Arc::new(PausedLoginStore {
            inner: InMemoryCredentialStore::new(),
            reached: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let alice = store
            .inner
            .insert(NewIdentity {
                username: "alice".to_string(),
                password_hash: password::hash("Secret1").unwrap(),
                role: Role::user(),
                email: None,
                first_name: None,
                last_name: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let svc = Arc::new(AccountService::new(store.clone(), jwt()));
        let login = tokio::spawn({
            let svc = svc.clone();
            async move { svc.login(LoginRequest::new("alice", "Secret1")).await }
        });

        store.reached.notified().await;
        svc.change_password(
            alice.id,
            ChangePasswordRequest {
                current_password: "Secret1".to_string(),
                new_password: "Secret2".to_string(),
            },
        )
        .await
        .unwrap();
        store.release.notify_one();
        assert!(login.await.unwrap().is_ok());

        let row = store.inner.find_by_id(alice.id).await.unwrap().unwrap();
        assert!(password::verify("Secret2", &row.password_hash));
        assert!(!password::verify("Secret1", &row.password_hash));
        assert!(row.last_login_at.is_some());
    }

    #[tokio::test]
    async fn seed_admin_refuses_a_username_held_by_a_regular_user() {
        let svc = service(jwt());
        svc.register(RegisterRequest::new("admin", "Squatter1")).await.unwrap();

        let err = svc.seed_admin("admin", "Admin123").await.unwrap_err();
        assert!(matches!(err, AccountError::SeedConflict(ref name) if name == "admin"));

        let stored = svc.store().find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::user());
    }
}
