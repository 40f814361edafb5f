//! Per-endpoint access decisions.
//!
//! - No IO
//! - No panics
//! - The caller hands in the bearer token and the clock; nothing is looked up
//!   from ambient request state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{JwtValidator, Principal, Role};

/// Access policy an endpoint declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Anonymous,
    Authenticated,
    RoleRequired(Role),
}

impl AccessPolicy {
    pub fn role(role: Role) -> Self {
        Self::RoleRequired(role)
    }

    pub fn admin() -> Self {
        Self::RoleRequired(Role::admin())
    }
}

/// Gate outcome for a rejected request.
///
/// Deliberately coarse: which verification step failed is never exposed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("not permitted")]
    Forbidden,
}

/// Decide whether a request may proceed.
///
/// Returns `Ok(None)` for anonymous endpoints and `Ok(Some(principal))` when a
/// token was required and accepted.
pub fn evaluate<V>(
    policy: &AccessPolicy,
    bearer: Option<&str>,
    validator: &V,
    now: DateTime<Utc>,
) -> Result<Option<Principal>, AccessDenied>
where
    V: JwtValidator + ?Sized,
{
    if *policy == AccessPolicy::Anonymous {
        return Ok(None);
    }

    let token = bearer.ok_or(AccessDenied::Unauthenticated)?;

    let claims = validator.validate(token, now).map_err(|e| {
        tracing::warn!(reason = %e, "bearer token rejected");
        AccessDenied::Unauthenticated
    })?;

    let principal = Principal::try_from(&claims).map_err(|_| AccessDenied::Unauthenticated)?;

    authorize(&principal, policy)?;
    Ok(Some(principal))
}

/// Role check for an already-verified principal.
pub fn authorize(principal: &Principal, policy: &AccessPolicy) -> Result<(), AccessDenied> {
    match policy {
        AccessPolicy::Anonymous | AccessPolicy::Authenticated => Ok(()),
        AccessPolicy::RoleRequired(required) => {
            if principal.has_role(required) {
                Ok(())
            } else {
                tracing::debug!(
                    user = %principal.username,
                    required = %required,
                    "role check failed"
                );
                Err(AccessDenied::Forbidden)
            }
        }
    }
}
