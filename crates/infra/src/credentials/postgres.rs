//! Postgres-backed credential store.
//!
//! Uniqueness is enforced by the database; a unique violation on insert is
//! reported as `StoreError::Conflict` for the offending column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use foodlabel_auth::{
    CredentialStore, Identity, NewIdentity, Role, StoreError, UniqueField, UsernamePolicy,
};
use foodlabel_core::UserId;

const USERS: &str = "users";

const COLUMNS: &str =
    "id, username, password_hash, role, email, first_name, last_name, created_at, last_login_at";

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
    policy: UsernamePolicy,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool, policy: UsernamePolicy) -> Self {
        Self { pool, policy }
    }

    /// Create the `users` table and its unique indexes if missing.
    ///
    /// The username index follows the store's case policy, so the policy must
    /// not change for an existing table.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {USERS} (
                id            BIGSERIAL PRIMARY KEY,
                username      VARCHAR(50)  NOT NULL,
                password_hash TEXT         NOT NULL,
                role          VARCHAR(50)  NOT NULL DEFAULT 'User',
                email         VARCHAR(255) NULL,
                first_name    VARCHAR(100) NULL,
                last_name     VARCHAR(100) NULL,
                created_at    TIMESTAMPTZ  NOT NULL,
                last_login_at TIMESTAMPTZ  NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        let username_key = match self.policy {
            UsernamePolicy::CaseSensitive => "username",
            UsernamePolicy::CaseInsensitive => "lower(username)",
        };
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {USERS}_username_key ON {USERS} ({username_key})"
        ))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {USERS}_email_key ON {USERS} (lower(email))"
        ))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    fn username_predicate(&self) -> &'static str {
        match self.policy {
            UsernamePolicy::CaseSensitive => "username = $1",
            UsernamePolicy::CaseInsensitive => "lower(username) = lower($1)",
        }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => UniqueField::Email,
                _ => UniqueField::Username,
            };
            return StoreError::Conflict(field);
        }
    }
    backend(e)
}

fn identity_from_row(row: &PgRow) -> Result<Identity, StoreError> {
    let id: i64 = row.try_get("id").map_err(backend)?;
    let role: String = row.try_get("role").map_err(backend)?;
    Ok(Identity {
        id: UserId::new(id).map_err(|e| StoreError::Backend(e.to_string()))?,
        username: row.try_get("username").map_err(backend)?,
        password_hash: row.try_get("password_hash").map_err(backend)?,
        role: Role::new(role),
        email: row.try_get("email").map_err(backend)?,
        first_name: row.try_get("first_name").map_err(backend)?,
        last_name: row.try_get("last_name").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        last_login_at: row.try_get("last_login_at").map_err(backend)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {USERS} WHERE {}",
            self.username_predicate()
        );
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM {USERS} WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM {USERS} WHERE lower(email) = lower($1)");
        sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.is_some())
            .map_err(backend)
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let sql = format!(
            "INSERT INTO {USERS} (username, password_hash, role, email, first_name, last_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&identity.username)
            .bind(&identity.password_hash)
            .bind(identity.role.as_str())
            .bind(&identity.email)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;
        identity_from_row(&row)
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {USERS} SET password_hash = $2, role = $3, email = $4, first_name = $5, \
             last_name = $6, last_login_at = $7 WHERE id = $1"
        );
        let result = sqlx::query(&sql)
            .bind(identity.id.get())
            .bind(&identity.password_hash)
            .bind(identity.role.as_str())
            .bind(&identity.email)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.last_login_at)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let sql = format!("UPDATE {USERS} SET last_login_at = $2 WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id.get())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
