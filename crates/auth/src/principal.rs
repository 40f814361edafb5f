use foodlabel_core::UserId;

use crate::{AuthError, JwtClaims, Role};

/// A verified caller, derived from token claims for the duration of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    /// Exact, case-sensitive role membership.
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl TryFrom<&JwtClaims> for Principal {
    type Error = AuthError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.user_id()?,
            username: claims.name.clone(),
            roles: claims.roles().to_vec(),
        })
    }
}
