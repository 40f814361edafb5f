//! Shared types for native and WASM builds.
//!
//! Wire DTOs mirror the API's JSON shapes (camelCase) without depending on
//! the server crates.

use serde::{Deserialize, Serialize};

/// Who the stored token says we are. Never verified client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Option<String>,
    pub username: String,
    pub roles: Vec<String>,
}

impl SessionIdentity {
    /// Exact, case-sensitive match against any carried role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "identity", rename_all = "lowercase")]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(SessionIdentity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&SessionIdentity> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// What subscribers see: the raw token and the identity derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub token: Option<String>,
    pub auth: AuthState,
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub username: String,
    pub role: String,
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}
