//! Token signing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default session lifetime: one hour.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_ISSUER: &str = "FoodLabelManager.API";
pub const DEFAULT_AUDIENCE: &str = "FoodLabelManager.Client";

/// Settings injected into the token issuer/verifier at construction.
///
/// `issuer` and `audience` are stamped into every token and, when set, must
/// match on verification. Leaving one as `None` omits the claim and skips the
/// check.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub secret_key: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_ttl", with = "ttl_seconds")]
    pub token_ttl: Duration,
}

fn default_ttl() -> Duration {
    DEFAULT_TOKEN_TTL
}

impl TokenConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            issuer: Some(DEFAULT_ISSUER.to_string()),
            audience: Some(DEFAULT_AUDIENCE.to_string()),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

// Keeps the secret out of logs.
impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

mod ttl_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
