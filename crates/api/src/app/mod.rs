//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and token wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(&config).await?;
    Ok(build_router(Arc::new(services)))
}

/// Router over already-wired services.
pub fn build_router(services: Arc<services::AppServices>) -> Router {
    routes::router(services).layer(
        ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_log)),
    )
}
