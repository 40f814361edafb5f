use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::app::services::AppServices;

pub mod auth;
pub mod labels;
pub mod system;

/// Every endpoint, each carrying its own access policy.
pub fn router(services: Arc<AppServices>) -> Router {
    let jwt = services.validator();

    Router::new()
        .route("/health", get(system::health))
        .nest("/api/auth", auth::router(&jwt))
        .nest("/api/foodlabels", labels::router(&jwt))
        .layer(Extension(services))
}
