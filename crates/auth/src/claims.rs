use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use foodlabel_core::UserId;

use crate::{IdentitySummary, Role};

/// Session token claim set.
///
/// Serialized with the registered JWT names (`sub`, `iat`, `exp`, `iss`,
/// `aud`) plus `name` and `role`. `sub` is the decimal user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,

    pub name: String,

    pub role: RoleClaim,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedToken)
    }

    pub fn roles(&self) -> &[Role] {
        self.role.roles()
    }

    /// The identity view of these claims (first role wins for multi-role tokens).
    pub fn summary(&self) -> Result<IdentitySummary, AuthError> {
        let role = self.roles().first().cloned().ok_or(AuthError::MalformedToken)?;
        Ok(IdentitySummary {
            id: self.user_id()?,
            username: self.name.clone(),
            role,
        })
    }
}

/// A `role` claim: tokens minted here carry one role, but a list is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(Role),
    Many(Vec<Role>),
}

impl RoleClaim {
    pub fn roles(&self) -> &[Role] {
        match self {
            RoleClaim::One(role) => std::slice::from_ref(role),
            RoleClaim::Many(roles) => roles,
        }
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::One(role)
    }
}

/// Why a token was rejected.
///
/// Callers outside the auth boundary only ever see a generic
/// "unauthenticated" outcome; the variant is for logs and tests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token issuer or audience mismatch")]
    InvalidAudience,
}

/// Check the time window and issuer/audience of already-decoded claims.
///
/// Expiry is checked before issuer/audience. `now >= exp` is expired.
pub fn validate_claims(
    claims: &JwtClaims,
    now: DateTime<Utc>,
    issuer: Option<&str>,
    audience: Option<&str>,
) -> Result<(), AuthError> {
    if now >= claims.expires_at {
        return Err(AuthError::Expired);
    }
    if let Some(expected) = issuer {
        if claims.iss.as_deref() != Some(expected) {
            return Err(AuthError::InvalidAudience);
        }
    }
    if let Some(expected) = audience {
        if claims.aud.as_deref() != Some(expected) {
            return Err(AuthError::InvalidAudience);
        }
    }
    Ok(())
}
