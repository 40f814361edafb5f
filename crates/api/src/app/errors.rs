use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;

use foodlabel_auth::{AccessDenied, AccountError};
use foodlabel_core::{DomainError, LabelId};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Gate rejections. The body never says which check failed.
pub fn access_denied_to_response(denied: AccessDenied) -> axum::response::Response {
    match denied {
        AccessDenied::Unauthenticated => {
            let mut res = json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "authentication required",
            );
            res.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
            res
        }
        AccessDenied::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "access denied"),
    }
}

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AccountError::DuplicateUsername | AccountError::DuplicateEmail => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        AccountError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        AccountError::CurrentPasswordMismatch => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_current_password",
            err.to_string(),
        ),
        AccountError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        AccountError::SeedConflict(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        AccountError::Hashing(_) | AccountError::Token(_) | AccountError::Store(_) => {
            tracing::error!(error = %err, "account operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Internal(msg) => {
            tracing::error!(error = %msg, "catalog operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

pub fn parse_label_id(s: &str) -> Result<LabelId, axum::response::Response> {
    s.parse::<LabelId>().map_err(domain_error_to_response)
}
