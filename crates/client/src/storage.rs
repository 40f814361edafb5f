//! Where the session token survives restarts.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Browser `localStorage` key, shared with the web front end.
pub const TOKEN_KEY: &str = "authToken";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage unavailable: {0}")]
    Unavailable(String),

    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted-token backend. Blank values read back as "no token".
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;

    async fn save(&self, token: &str) -> Result<(), StorageError>;

    async fn remove(&self) -> Result<(), StorageError>;
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Process-lifetime storage for tests and headless tools.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    inner: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Some(token.into())),
        }
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let guard = self.inner.lock().map_err(|_| poisoned())?;
        Ok(guard.clone().and_then(non_blank))
    }

    async fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.inner.lock().map_err(|_| poisoned())? = Some(token.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), StorageError> {
        *self.inner.lock().map_err(|_| poisoned())? = None;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileTokenStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;

    use super::{StorageError, TokenStorage, non_blank};

    /// Token kept in a single file, e.g. `~/.local/share/foodlabel/auth_token`.
    #[derive(Debug, Clone)]
    pub struct FileTokenStorage {
        path: PathBuf,
    }

    impl FileTokenStorage {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// The per-user data directory location.
        pub fn default_location() -> Result<Self, StorageError> {
            let dir = dirs::data_local_dir()
                .ok_or_else(|| StorageError::Unavailable("no local data directory".to_string()))?;
            Ok(Self::new(dir.join("foodlabel").join("auth_token")))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    #[async_trait]
    impl TokenStorage for FileTokenStorage {
        async fn load(&self) -> Result<Option<String>, StorageError> {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(contents) => Ok(non_blank(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        async fn save(&self, token: &str) -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&self.path, token).await?;
            Ok(())
        }

        async fn remove(&self) -> Result<(), StorageError> {
            match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebTokenStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use async_trait::async_trait;

    use super::{StorageError, TOKEN_KEY, TokenStorage, non_blank};

    /// `window.localStorage[TOKEN_KEY]`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WebTokenStorage;

    fn local_storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window object".to_string()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
    }

    #[async_trait]
    impl TokenStorage for WebTokenStorage {
        async fn load(&self) -> Result<Option<String>, StorageError> {
            let value = local_storage()?
                .get_item(TOKEN_KEY)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
            Ok(value.and_then(non_blank))
        }

        async fn save(&self, token: &str) -> Result<(), StorageError> {
            local_storage()?
                .set_item(TOKEN_KEY, token)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        async fn remove(&self) -> Result<(), StorageError> {
            local_storage()?
                .remove_item(TOKEN_KEY)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let storage = MemoryTokenStorage::new();
        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("a.b.c").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("a.b.c"));

        storage.remove().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn blank_tokens_read_as_absent() {
        let storage = MemoryTokenStorage::with_token("   ");
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn file_storage_creates_parents_and_tolerates_missing_file() {
        let dir = std::env::temp_dir().join(format!("foodlabel-client-{}", std::process::id()));
        let storage = FileTokenStorage::new(dir.join("nested").join("auth_token"));

        assert_eq!(storage.load().await.unwrap(), None);
        storage.remove().await.unwrap();

        storage.save("x.y.z").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("x.y.z"));

        storage.remove().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }
}
