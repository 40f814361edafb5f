//! Local, unverified decoding of a token's payload segment.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::SessionIdentity;

const NAME_KEYS: &[&str] = &[
    "name",
    "unique_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];

const ROLE_KEYS: &[&str] = &[
    "role",
    "roles",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

const SUBJECT_KEYS: &[&str] = &[
    "sub",
    "nameid",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not three dot-separated segments")]
    Malformed,

    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no `{0}` claim")]
    MissingClaim(&'static str),
}

/// Re-add the `=` padding base64url tokens drop.
pub fn restore_padding(segment: &str) -> String {
    match segment.len() % 4 {
        2 => format!("{segment}=="),
        3 => format!("{segment}="),
        _ => segment.to_string(),
    }
}

/// Decode the payload segment into a flat claim map.
pub fn decode_payload(token: &str) -> Result<Map<String, Value>, DecodeError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DecodeError::Malformed);
    };
    if payload.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let bytes = URL_SAFE.decode(restore_padding(payload))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Derive the session identity from a token without checking its signature.
///
/// A `role` claim may be a string or a list; either way every role is kept.
pub fn decode_claims(token: &str) -> Result<SessionIdentity, DecodeError> {
    let claims = decode_payload(token)?;

    let username = first_string(&claims, NAME_KEYS).ok_or(DecodeError::MissingClaim("name"))?;
    let user_id = SUBJECT_KEYS.iter().find_map(|k| match claims.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut roles = Vec::new();
    for key in ROLE_KEYS {
        match claims.get(*key) {
            Some(Value::String(role)) => push_unique(&mut roles, role),
            Some(Value::Array(list)) => {
                for role in list.iter().filter_map(Value::as_str) {
                    push_unique(&mut roles, role);
                }
            }
            _ => {}
        }
    }

    Ok(SessionIdentity {
        user_id,
        username,
        roles,
    })
}

fn push_unique(roles: &mut Vec<String>, role: &str) {
    if !roles.iter().any(|r| r == role) {
        roles.push(role.to_string());
    }
}

fn first_string(claims: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| claims.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}
