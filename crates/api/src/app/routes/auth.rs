use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};

use foodlabel_auth::{AccessPolicy, JwtValidator};
use foodlabel_auth::dto::{ChangePasswordRequest, LoginRequest, RegisterRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::middleware::guard;

pub fn router(jwt: &Arc<dyn JwtValidator>) -> Router {
    Router::new()
        .route("/register", guard(post(register), jwt, AccessPolicy::Anonymous))
        .route("/login", guard(post(login), jwt, AccessPolicy::Anonymous))
        .route("/me", guard(get(me), jwt, AccessPolicy::Authenticated))
        .route(
            "/change-password",
            guard(post(change_password), jwt, AccessPolicy::Authenticated),
        )
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match services.accounts.register(body).await {
        Ok(res) => Json(res).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match services.accounts.login(body).await {
        Ok(res) => Json(res).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.accounts.profile(principal.user_id()).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match services.accounts.change_password(principal.user_id(), body).await {
        Ok(()) => Json(dto::MessageResponse::new("password changed")).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
