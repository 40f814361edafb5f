//! Client session state machine.
//!
//! Two states, `Anonymous` and `Authenticated(identity)`. The identity is
//! always derived from the token currently in storage. Transitions are
//! serialised and each one publishes its resulting state before the next
//! transition may start, so a subscriber never sees a superseded state after
//! a newer one.

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use crate::claims::{DecodeError, decode_claims};
use crate::storage::{StorageError, TokenStorage};
use crate::types::{AuthState, SessionIdentity, SessionState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("token could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

pub struct SessionManager<S> {
    storage: S,
    state: watch::Sender<SessionState>,
    transition: Mutex<()>,
}

impl<S> SessionManager<S>
where
    S: TokenStorage,
{
    /// Starts `Anonymous`; call [`initialize`](Self::initialize) to pick up a
    /// persisted token.
    pub fn new(storage: S) -> Self {
        let (state, _) = watch::channel(SessionState::anonymous());
        Self {
            storage,
            state,
            transition: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// A receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().auth.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Recompute the session from storage.
    ///
    /// A stored token that cannot be decoded is discarded and the session
    /// stays `Anonymous`.
    pub async fn initialize(&self) -> Result<AuthState, SessionError> {
        let _guard = self.transition.lock().await;

        let next = match self.storage.load().await? {
            None => SessionState::anonymous(),
            Some(token) => match decode_claims(&token) {
                Ok(identity) => authenticated(token, identity),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding undecodable stored token");
                    self.storage.remove().await?;
                    SessionState::anonymous()
                }
            },
        };

        Ok(self.publish(next))
    }

    /// Persist `token` and switch to `Authenticated`. Replaces any current session.
    ///
    /// `username` and `role` are what the server reported alongside the
    /// token; the session identity itself comes from the token's claims. A
    /// token that cannot be decoded is rejected and nothing changes.
    pub async fn login(&self, username: &str, role: &str, token: &str) -> Result<SessionIdentity, SessionError> {
        let token = token.trim();
        let identity = decode_claims(token)?;
        if identity.username != username || !identity.has_role(role) {
            tracing::debug!(
                reported_user = %username,
                token_user = %identity.username,
                "login response differs from token claims; using claims"
            );
        }

        let _guard = self.transition.lock().await;
        self.storage.save(token).await?;
        self.publish(authenticated(token.to_string(), identity.clone()));
        Ok(identity)
    }

    /// Forget the token and switch to `Anonymous`.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.transition.lock().await;
        self.storage.remove().await?;
        self.publish(SessionState::anonymous());
        Ok(())
    }

    fn publish(&self, next: SessionState) -> AuthState {
        let auth = next.auth.clone();
        self.state.send_replace(next);
        auth
    }
}

fn authenticated(token: String, identity: SessionIdentity) -> SessionState {
    SessionState {
        token: Some(token),
        auth: AuthState::Authenticated(identity),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryTokenStorage;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token(name: &str, role: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(json!({ "sub": "1", "name": name, "role": role }).to_string());
        format!("{header}.{body}.sig")
    }

    #[tokio::test]
    async fn initialize_without_token_stays_anonymous() {
        let session = SessionManager::new(MemoryTokenStorage::new());
        assert_eq!(session.initialize().await.unwrap(), AuthState::Anonymous);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn initialize_picks_up_stored_token() {
        let stored = token("alice", json!("User"));
        let session = SessionManager::new(MemoryTokenStorage::with_token(stored.clone()));

        let state = session.initialize().await.unwrap();
        let identity = state.identity().unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.roles, vec!["User"]);
        assert_eq!(session.token(), Some(stored));
    }

    #[tokio::test]
    async fn initialize_discards_undecodable_token() {
        let session = SessionManager::new(MemoryTokenStorage::with_token("garbage"));
        assert_eq!(session.initialize().await.unwrap(), AuthState::Anonymous);
        assert_eq!(session.storage().load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn login_then_logout_notifies_subscribers() {
        let session = SessionManager::new(MemoryTokenStorage::new());
        let mut rx = session.subscribe();

        let t = token("root", json!(["Admin", "User"]));
        let identity = session.login("root", "Admin", &t).await.unwrap();
        assert_eq!(identity.roles, vec!["Admin", "User"]);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().auth.is_authenticated());
        assert_eq!(session.storage().load().await.unwrap(), Some(t));

        session.logout().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::anonymous());
        assert_eq!(session.storage().load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_login_replaces_the_session() {
        let session = SessionManager::new(MemoryTokenStorage::new());
        session.login("alice", "User", &token("alice", json!("User"))).await.unwrap();
        session.login("bob", "Admin", &token("bob", json!("Admin"))).await.unwrap();

        let state = session.auth_state();
        assert_eq!(state.identity().unwrap().username, "bob");
    }

    #[tokio::test]
    async fn login_with_undecodable_token_changes_nothing() {
        let session = SessionManager::new(MemoryTokenStorage::new());
        let err = session.login("alice", "User", "not-a-jwt").await.unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(session.current(), SessionState::anonymous());
        assert_eq!(session.storage().load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_transitions_converge_on_the_last_one() {
        let session = Arc::new(SessionManager::new(MemoryTokenStorage::new()));
        let mut handles = Vec::new();
        for i in 0..16 {
            let session = session.clone();
            let name = format!("user{i}");
            handles.push(tokio::spawn(async move {
                session.login(&name, "User", &token(&name, json!("User"))).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Whatever won, the published state matches what is persisted.
        let state = session.current();
        assert_eq!(session.storage().load().await.unwrap(), state.token);
        let identity = state.auth.identity().unwrap().clone();
        assert_eq!(decode_claims(state.token.as_deref().unwrap()).unwrap(), identity);
    }
}
