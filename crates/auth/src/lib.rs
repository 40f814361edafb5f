//! `foodlabel-auth` — authentication and authorization core.
//!
//! Password hashing, token issuance/verification, the per-endpoint access
//! gate, and the account service. Decoupled from HTTP; persistence is behind
//! [`CredentialStore`].

pub mod claims;
pub mod config;
pub mod dto;
pub mod gate;
pub mod identity;
pub mod password;
pub mod principal;
pub mod roles;
pub mod service;
pub mod store;
pub mod token;

pub use claims::{AuthError, JwtClaims, RoleClaim, validate_claims};
pub use config::TokenConfig;
pub use gate::{AccessDenied, AccessPolicy, authorize, evaluate};
pub use identity::{Identity, IdentitySummary, NewIdentity, UserProfile};
pub use principal::Principal;
pub use roles::Role;
pub use service::{AccountError, AccountService};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError, UniqueField, UsernamePolicy};
pub use token::{Hs256Jwt, JwtIssuer, JwtValidator};
