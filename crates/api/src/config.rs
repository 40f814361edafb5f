//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};

use foodlabel_auth::{TokenConfig, UsernamePolicy};
use foodlabel_auth::config::DEFAULT_TOKEN_TTL;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

const DEV_SECRET: &str = "dev-secret-change-me-dev-secret-change-me";

/// Admin identity created at startup if missing.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub token: TokenConfig,
    pub username_policy: UsernamePolicy,
    pub admin: Option<AdminSeed>,
    /// Only honoured when built with the `postgres` feature.
    pub database_url: Option<String>,
}

impl ApiConfig {
    /// In-memory stores, no admin seed, default bind address.
    pub fn new(token: TokenConfig) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            token,
            username_policy: UsernamePolicy::default(),
            admin: None,
            database_url: None,
        }
    }

    pub fn with_admin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin = Some(AdminSeed {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    ///
    /// | key | default |
    /// |---|---|
    /// | `JWT_SECRET` | insecure dev secret (logged at `warn`) |
    /// | `JWT_ISSUER` / `JWT_AUDIENCE` | `FoodLabelManager.API` / `FoodLabelManager.Client`; `-` disables |
    /// | `JWT_TTL_MINUTES` | 60 |
    /// | `BIND_ADDR` | `0.0.0.0:8080` |
    /// | `USERNAME_CASE_INSENSITIVE` | `false` |
    /// | `ADMIN_USERNAME` / `ADMIN_PASSWORD` | `admin` / no seed |
    /// | `DATABASE_URL` | in-memory stores |
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let mut token = TokenConfig::new(secret);
        if let Some(issuer) = get("JWT_ISSUER") {
            token = token.with_issuer(disable_marker(issuer));
        }
        if let Some(audience) = get("JWT_AUDIENCE") {
            token = token.with_audience(disable_marker(audience));
        }
        let ttl = match get("JWT_TTL_MINUTES") {
            Some(raw) => {
                let minutes: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw}"))?;
                if minutes == 0 {
                    bail!("JWT_TTL_MINUTES must be positive");
                }
                Duration::from_secs(minutes * 60)
            }
            None => DEFAULT_TOKEN_TTL,
        };
        token = token.with_ttl(ttl);

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let username_policy = match get("USERNAME_CASE_INSENSITIVE").as_deref() {
            Some("1" | "true" | "yes") => UsernamePolicy::CaseInsensitive,
            _ => UsernamePolicy::CaseSensitive,
        };

        let admin = get("ADMIN_PASSWORD").map(|password| AdminSeed {
            username: get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            password,
        });

        Ok(Self {
            bind_addr,
            token,
            username_policy,
            admin,
            database_url: get("DATABASE_URL"),
        })
    }
}

fn disable_marker(value: String) -> Option<String> {
    (value != "-").then_some(value)
}
