//! Credential store backends.

pub use foodlabel_auth::InMemoryCredentialStore;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresCredentialStore;
