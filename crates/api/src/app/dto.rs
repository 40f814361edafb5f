use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::StatusCode;
use serde::Serialize;

use crate::app::errors;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwrap a JSON body, answering malformed input with our 400 shape.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    })
}

pub fn query_params<T>(
    params: Result<Query<T>, QueryRejection>,
) -> Result<T, axum::response::Response> {
    params.map(|Query(q)| q).map_err(|rejection| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
    })
}
