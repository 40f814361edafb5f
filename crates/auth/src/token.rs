//! HS256 session tokens.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, each part
//! base64url). Nothing is stored server-side; a token stops working only when
//! it expires.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{AuthError, IdentitySummary, JwtClaims, TokenConfig, validate_claims};

/// Mints signed tokens for an identity.
pub trait JwtIssuer: Send + Sync {
    fn issue(
        &self,
        identity: &IdentitySummary,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error>;
}

/// Verifies a token and yields its claims.
///
/// Implementations must be pure: no I/O, no shared mutable state.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// Symmetric-key issuer and verifier.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl Hs256Jwt {
    pub fn new(config: TokenConfig) -> Self {
        let secret = config.secret_key.as_bytes();

        // Signature and structure only; time window and issuer/audience are
        // checked by `validate_claims` so the failure order is ours.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            config,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Claims that `issue` would sign for `identity` at `now`.
    pub fn claims_for(&self, identity: &IdentitySummary, now: DateTime<Utc>) -> JwtClaims {
        // TTLs beyond chrono's range are clamped to the far future.
        let ttl = chrono::Duration::from_std(self.config.token_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100));
        JwtClaims {
            sub: identity.id.to_string(),
            name: identity.username.clone(),
            role: identity.role.clone().into(),
            issued_at: now,
            expires_at: now + ttl,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        }
    }

    /// Verify against the wall clock.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        self.validate(token, Utc::now())
    }
}

impl JwtIssuer for Hs256Jwt {
    fn issue(
        &self,
        identity: &IdentitySummary,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = self.claims_for(identity, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(AuthError::MalformedToken);
        }

        let claims = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        // A subject that is not a user id is a malformed claim set.
        claims.user_id()?;
        if claims.roles().is_empty() {
            return Err(AuthError::MalformedToken);
        }

        validate_claims(
            &claims,
            now,
            self.config.issuer.as_deref(),
            self.config.audience.as_deref(),
        )?;

        Ok(claims)
    }
}
