//! Registered principals.
//!
//! One model covers both the minimal identity (`id`, `username`, `role`) and
//! the profile-carrying one; the profile fields are simply optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodlabel_core::{Entity, UserId};

use crate::Role;

/// A registered identity as held by the credential store.
///
/// # Invariants
/// - `username` is unique within the store and never changes.
/// - `password_hash` is a PHC string produced by [`crate::password::hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

impl Entity for Identity {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Identity data before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The subset of an identity that ends up in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// Public view of an identity (never includes the hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}
