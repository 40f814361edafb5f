use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;

use foodlabel_auth::{AccessPolicy, JwtValidator};
use foodlabel_infra::{LabelDraft, LabelQuery};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::middleware::guard;

pub fn router(jwt: &Arc<dyn JwtValidator>) -> Router {
    Router::new()
        .route(
            "/",
            guard(get(list_labels), jwt, AccessPolicy::Anonymous)
                .merge(guard(post(create_label), jwt, AccessPolicy::Authenticated)),
        )
        .route(
            "/categories",
            guard(get(list_categories), jwt, AccessPolicy::Anonymous),
        )
        .route(
            "/:id",
            guard(get(get_label), jwt, AccessPolicy::Anonymous)
                .merge(guard(put(update_label), jwt, AccessPolicy::Authenticated))
                .merge(guard(delete(delete_label), jwt, AccessPolicy::admin())),
        )
}

pub async fn list_labels(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<LabelQuery>, QueryRejection>,
) -> axum::response::Response {
    let query = match dto::query_params(params) {
        Ok(q) => q,
        Err(res) => return res,
    };

    match services.labels.list(&query) {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.labels.categories() {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_label(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_label_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.labels.get(id) {
        Ok(Some(label)) => Json(label).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "label not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_label(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<LabelDraft>, JsonRejection>,
) -> axum::response::Response {
    let draft = match dto::json_body(payload) {
        Ok(d) => d,
        Err(res) => return res,
    };

    match services.labels.create(draft, principal.user_id(), Utc::now()) {
        Ok(label) => {
            tracing::info!(label_id = %label.id, user_id = %principal.user_id(), "label created");
            (
                StatusCode::CREATED,
                [(header::LOCATION, format!("/api/foodlabels/{}", label.id))],
                Json(label),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_label(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<LabelDraft>, JsonRejection>,
) -> axum::response::Response {
    let id = match errors::parse_label_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let draft = match dto::json_body(payload) {
        Ok(d) => d,
        Err(res) => return res,
    };

    match services.labels.update(id, draft, principal.user_id(), Utc::now()) {
        Ok(label) => Json(label).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_label(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_label_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.labels.deactivate(id) {
        Ok(()) => {
            tracing::info!(label_id = %id, user = %principal.username(), "label deactivated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
