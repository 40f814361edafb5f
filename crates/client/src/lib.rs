//! `foodlabel-client`
//!
//! Client-side session handling for the food-label API:
//! - persisted token storage (memory, file, browser `localStorage`)
//! - local, unverified claim decoding for display and role checks
//! - a session state machine that notifies subscribers on every transition
//! - an HTTP transport that attaches the current bearer token

pub mod claims;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use claims::{DecodeError, decode_claims};
pub use session::{SessionError, SessionManager};
pub use storage::{MemoryTokenStorage, StorageError, TokenStorage};
pub use transport::{ApiClient, ClientError};
pub use types::{AuthResponse, AuthState, LoginRequest, RegisterRequest, SessionIdentity, SessionState, UserProfile};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileTokenStorage;

#[cfg(target_arch = "wasm32")]
pub use storage::WebTokenStorage;
