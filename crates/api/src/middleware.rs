use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::{self as axum_mw, Next},
    response::Response,
    routing::MethodRouter,
};
use chrono::Utc;

use foodlabel_auth::{AccessPolicy, JwtValidator, gate};

use crate::app::errors;
use crate::context::PrincipalContext;

/// State for one gated route: the verifier plus the policy it declares.
#[derive(Clone)]
pub struct GateState {
    pub jwt: Arc<dyn JwtValidator>,
    pub policy: AccessPolicy,
}

/// Run the access gate before the handler.
///
/// On success the verified principal (if any) is attached to the request as
/// a [`PrincipalContext`] extension.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let bearer = extract_bearer(req.headers());

    match gate::evaluate(&state.policy, bearer, state.jwt.as_ref(), Utc::now()) {
        Ok(Some(principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
        }
        Ok(None) => {}
        Err(denied) => return errors::access_denied_to_response(denied),
    }

    next.run(req).await
}

/// Attach the gate with `policy` to every method handler in `route`.
pub fn guard(route: MethodRouter, jwt: &Arc<dyn JwtValidator>, policy: AccessPolicy) -> MethodRouter {
    let state = GateState {
        jwt: jwt.clone(),
        policy,
    };
    route.route_layer(axum_mw::from_fn_with_state(state, gate_middleware))
}

/// Access log line per request. Never records headers.
pub async fn request_log(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    res
}

/// `Authorization: Bearer <token>`, or `None` for anything else.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
