//! Credential store contract and the in-memory implementation.
//!
//! The store owns id assignment and the uniqueness constraints; callers never
//! see partially-written identities.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use foodlabel_core::UserId;

use crate::{Identity, NewIdentity};

/// How usernames are compared. Fixed when a store is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsernamePolicy {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl UsernamePolicy {
    pub fn matches(&self, stored: &str, candidate: &str) -> bool {
        match self {
            UsernamePolicy::CaseSensitive => stored == candidate,
            UsernamePolicy::CaseInsensitive => stored.to_lowercase() == candidate.to_lowercase(),
        }
    }
}

/// Column a uniqueness violation was reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl core::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(UniqueField),

    #[error("record not found")]
    NotFound,

    #[error("credential store failure: {0}")]
    Backend(String),
}

/// Persistence operations the auth core relies on.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError>;

    /// Emails are compared case-insensitively.
    async fn email_taken(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert and assign an id. Fails with `Conflict` on a duplicate username or email.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Replace an existing record (matched by id).
    async fn update(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Set `last_login_at` only; every other column is left as stored.
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
        (**self).email_taken(email).await
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        (**self).insert(identity).await
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        (**self).update(identity).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).record_login(id, at).await
    }
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<UserId, Identity>,
}

/// In-memory credential store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    policy: UsernamePolicy,
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UsernamePolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn policy(&self) -> UsernamePolicy {
        self.policy
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

fn same_email(a: &Option<String>, b: &str) -> bool {
    a.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(b))
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .rows
            .values()
            .find(|i| self.policy.matches(&i.username, username))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().any(|i| same_email(&i.email, email)))
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if inner
            .rows
            .values()
            .any(|i| self.policy.matches(&i.username, &identity.username))
        {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if let Some(email) = identity.email.as_deref() {
            if inner.rows.values().any(|i| same_email(&i.email, email)) {
                return Err(StoreError::Conflict(UniqueField::Email));
            }
        }

        let id = UserId::new(inner.last_id + 1).map_err(|e| StoreError::Backend(e.to_string()))?;
        inner.last_id = id.get();

        let stored = Identity {
            id,
            username: identity.username,
            password_hash: identity.password_hash,
            role: identity.role,
            email: identity.email,
            first_name: identity.first_name,
            last_name: identity.last_name,
            created_at: identity.created_at,
            last_login_at: None,
        };
        inner.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        match inner.rows.get_mut(&identity.id) {
            Some(row) => {
                *row = identity.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.last_login_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn new_identity(username: &str, email: Option<&str>) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            role: Role::user(),
            email: email.map(str::to_string),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially_and_never_reused() {
        let store = InMemoryCredentialStore::new();
        let a = store.insert(new_identity("a", None)).await.unwrap();
        let b = store.insert(new_identity("b", None)).await.unwrap();
        assert_eq!(a.id.get(), 1);
        assert_eq!(b.id.get(), 2);

        // A rejected insert does not burn or recycle an id.
        assert!(store.insert(new_identity("a", None)).await.is_err());
        let c = store.insert(new_identity("c", None)).await.unwrap();
        assert_eq!(c.id.get(), 3);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_under_each_policy() {
        let sensitive = InMemoryCredentialStore::new();
        sensitive.insert(new_identity("Alice", None)).await.unwrap();
        assert!(sensitive.insert(new_identity("alice", None)).await.is_ok());
        assert_eq!(
            sensitive.insert(new_identity("Alice", None)).await,
            Err(StoreError::Conflict(UniqueField::Username))
        );

        let insensitive = InMemoryCredentialStore::with_policy(UsernamePolicy::CaseInsensitive);
        insensitive.insert(new_identity("Alice", None)).await.unwrap();
        assert_eq!(
            insensitive.insert(new_identity("ALICE", None)).await,
            Err(StoreError::Conflict(UniqueField::Username))
        );
        assert!(insensitive.find_by_username("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let store = InMemoryCredentialStore::new();
        store.insert(new_identity("a", Some("a@example.com"))).await.unwrap();
        assert!(store.email_taken("A@Example.com").await.unwrap());
        assert_eq!(
            store.insert(new_identity("b", Some("A@EXAMPLE.COM"))).await,
            Err(StoreError::Conflict(UniqueField::Email))
        );
    }

    #[tokio::test]
    async fn update_replaces_existing_and_rejects_unknown() {
        let store = InMemoryCredentialStore::new();
        let mut a = store.insert(new_identity("a", None)).await.unwrap();
        a.last_login_at = Some(Utc::now());
        store.update(&a).await.unwrap();
        assert_eq!(store.find_by_id(a.id).await.unwrap(), Some(a.clone()));

        a.id = UserId::new(99).unwrap();
        assert_eq!(store.update(&a).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn record_login_touches_only_the_timestamp() {
        let store = InMemoryCredentialStore::new();
        let stored = store.insert(new_identity("alice", None)).await.unwrap();

        let mut changed = stored.clone();
        changed.password_hash = "$argon2id$rotated".to_string();
        store.update(&changed).await.unwrap();

        let at = Utc::now();
        store.record_login(stored.id, at).await.unwrap();

        let row = store.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(row.last_login_at, Some(at));
        assert_eq!(row.password_hash, "$argon2id$rotated");

        let missing = UserId::new(99).unwrap();
        assert_eq!(store.record_login(missing, at).await, Err(StoreError::NotFound));
    }
}
