//! HTTP transport bound to a session.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::session::{SessionError, SessionManager};
use crate::storage::TokenStorage;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, SessionIdentity, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            ClientError::Session(_) => None,
        }
    }
}

/// Calls the API, attaching `Authorization: Bearer` whenever the session
/// holds a token.
pub struct ApiClient<S> {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager<S>>,
}

impl<S> Clone for ApiClient<S> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S> ApiClient<S>
where
    S: TokenStorage,
{
    pub fn new(base_url: impl Into<String>, session: Arc<SessionManager<S>>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionManager<S>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager<S>> {
        &self.session
    }

    /// A request to `path` carrying the current token, if any.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.session.token().as_deref().map(bearer_value) {
            Some(token) if !token.is_empty() => req.bearer_auth(token),
            _ => req,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let res = self.request(Method::GET, path).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.request(method, path).json(body).send().await?;
        Ok(check(res).await?.json().await?)
    }

    /// Log in and start a session with the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionIdentity, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let res: AuthResponse = self.send_json(Method::POST, "/api/auth/login", &body).await?;
        self.start_session(res).await
    }

    /// Register and start a session for the new account.
    pub async fn register(&self, req: &RegisterRequest) -> Result<SessionIdentity, ClientError> {
        let res: AuthResponse = self.send_json(Method::POST, "/api/auth/register", req).await?;
        self.start_session(res).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session.logout().await?;
        Ok(())
    }

    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.get_json("/api/auth/me").await
    }

    async fn start_session(&self, res: AuthResponse) -> Result<SessionIdentity, ClientError> {
        let token = bearer_value(&res.token);
        Ok(self.session.login(&res.username, &res.role, token).await?)
    }
}

/// Tokens that went through a JSON string round-trip sometimes keep their quotes.
fn bearer_value(token: &str) -> &str {
    token.trim().trim_matches('"')
}

async fn check(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stray_quotes_are_stripped() {
        assert_eq!(bearer_value("\"a.b.c\""), "a.b.c");
        assert_eq!(bearer_value(" a.b.c "), "a.b.c");
        assert_eq!(bearer_value("a.b.c"), "a.b.c");
    }
}
