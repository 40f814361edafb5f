use std::sync::Arc;

use foodlabel_auth::{
    AccountService, CredentialStore, Hs256Jwt, InMemoryCredentialStore, JwtIssuer, JwtValidator,
};
use foodlabel_infra::{InMemoryLabelStore, LabelStore};

use crate::config::ApiConfig;

pub type SharedCredentialStore = Arc<dyn CredentialStore>;

/// Everything the handlers reach through `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub accounts: AccountService<SharedCredentialStore>,
    pub labels: Arc<dyn LabelStore>,
    jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    pub fn new(
        credentials: SharedCredentialStore,
        labels: Arc<dyn LabelStore>,
        jwt: Arc<Hs256Jwt>,
    ) -> Self {
        let issuer: Arc<dyn JwtIssuer> = jwt.clone();
        Self {
            accounts: AccountService::new(credentials, issuer),
            labels,
            jwt,
        }
    }

    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }
}

/// Wire stores and the token service from configuration, then seed the admin
/// identity if one is configured.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let jwt = Arc::new(Hs256Jwt::new(config.token.clone()));
    let credentials = credential_store(config).await?;
    let labels: Arc<dyn LabelStore> = Arc::new(InMemoryLabelStore::new());

    let services = AppServices::new(credentials, labels, jwt);

    if let Some(admin) = &config.admin {
        services
            .accounts
            .seed_admin(&admin.username, &admin.password)
            .await?;
    }

    Ok(services)
}

#[cfg(feature = "postgres")]
async fn credential_store(config: &ApiConfig) -> anyhow::Result<SharedCredentialStore> {
    use anyhow::Context;
    use foodlabel_infra::credentials::PostgresCredentialStore;

    let Some(url) = config.database_url.as_deref() else {
        return Ok(Arc::new(InMemoryCredentialStore::with_policy(config.username_policy)));
    };

    let pool = sqlx::PgPool::connect(url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    let store = PostgresCredentialStore::new(pool, config.username_policy);
    store.migrate().await?;
    tracing::info!("using postgres credential store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn credential_store(config: &ApiConfig) -> anyhow::Result<SharedCredentialStore> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored; built without the postgres feature");
    }
    Ok(Arc::new(InMemoryCredentialStore::with_policy(config.username_policy)))
}
