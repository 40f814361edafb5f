use std::sync::Arc;

use foodlabel_api::ApiConfig;
use foodlabel_auth::TokenConfig;
use foodlabel_client::{
    ApiClient, AuthState, ClientError, FileTokenStorage, MemoryTokenStorage, RegisterRequest,
    SessionManager,
};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = ApiConfig::new(TokenConfig::new("client-secret")).with_admin("admin", "Admin123");
        let app = foodlabel_api::app::build_app(config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn client(srv: &TestServer) -> ApiClient<MemoryTokenStorage> {
    let session = Arc::new(SessionManager::new(MemoryTokenStorage::new()));
    ApiClient::new(srv.base_url.clone(), session)
}

#[tokio::test]
async fn register_attaches_token_until_logout() {
    let srv = TestServer::spawn().await;
    let api = client(&srv);

    let identity = api
        .register(&RegisterRequest {
            username: "alice".to_string(),
            password: "Secret1".to_string(),
            ..RegisterRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(identity.username, "alice");
    assert_eq!(identity.roles, vec!["User"]);

    let me = api.me().await.unwrap();
    assert_eq!(me.username, "alice");

    api.logout().await.unwrap();
    assert_eq!(api.session().auth_state(), AuthState::Anonymous);

    let err = api.me().await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }));
}

#[tokio::test]
async fn bad_credentials_leave_the_session_anonymous() {
    let srv = TestServer::spawn().await;
    let api = client(&srv);

    let err = api.login("admin", "wrong-password").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(api.session().auth_state(), AuthState::Anonymous);
}

#[tokio::test]
async fn role_gated_delete_follows_the_session() {
    let srv = TestServer::spawn().await;
    let user = client(&srv);
    user.register(&RegisterRequest {
        username: "bob".to_string(),
        password: "Secret1".to_string(),
        ..RegisterRequest::default()
    })
    .await
    .unwrap();

    let label: Value = user
        .send_json(
            Method::POST,
            "/api/foodlabels",
            &json!({ "name": "Salt", "description": "NaCl" }),
        )
        .await
        .unwrap();
    let path = format!("/api/foodlabels/{}", label["id"]);

    let res = user.request(Method::DELETE, &path).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = client(&srv);
    let identity = admin.login("admin", "Admin123").await.unwrap();
    assert!(identity.has_role("Admin"));

    let res = admin.request(Method::DELETE, &path).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let srv = TestServer::spawn().await;
    let path = std::env::temp_dir()
        .join(format!("foodlabel-client-restart-{}", std::process::id()))
        .join("auth_token");

    {
        let session = Arc::new(SessionManager::new(FileTokenStorage::new(&path)));
        let api = ApiClient::new(srv.base_url.clone(), session);
        api.login("admin", "Admin123").await.unwrap();
    }

    let session = Arc::new(SessionManager::new(FileTokenStorage::new(&path)));
    let state = session.initialize().await.unwrap();
    assert_eq!(state.identity().unwrap().username, "admin");

    let api = ApiClient::new(srv.base_url.clone(), session);
    assert_eq!(api.me().await.unwrap().role, "Admin");

    api.logout().await.unwrap();
    assert!(!path.exists());
}
