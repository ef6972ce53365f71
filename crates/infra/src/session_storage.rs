//! Persistence of the signed-in session between runs.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use auditdesk_auth::Session;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("session storage io error: {0}")]
    Io(String),

    #[error("stored session is unreadable: {0}")]
    Corrupt(String),

    #[error("could not resolve a data directory for the session file")]
    NoDataDir,
}

#[async_trait::async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, StorageError>;
    async fn save(&self, session: &Session) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file, by default `{data_dir}/auditdesk/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `path` if given, otherwise the platform default.
    pub fn at_or_default(path: Option<PathBuf>) -> Result<Self, StorageError> {
        match path {
            Some(p) => Ok(Self::new(p)),
            None => Ok(Self::new(default_session_path()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `{app_data_dir}/auditdesk/session.json`
pub fn default_session_path() -> Result<PathBuf, StorageError> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(StorageError::NoDataDir)?;
    dir.push("auditdesk");
    dir.push("session.json");
    Ok(dir)
}

#[async_trait::async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("create {parent:?}: {e}")))?;
        }
        let bytes = serde_json::to_vec_pretty(session).map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}

/// Process-local storage for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

#[async_trait::async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.current())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|e| StorageError::Io(e.to_string()))?;
        *slot = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|e| StorageError::Io(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_auth::Identity;
    use auditdesk_core::UserId;
    use chrono::Utc;

    fn session() -> Session {
        Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now(),
            identity: Identity {
                id: UserId::new(),
                email: "a@b.co".into(),
            },
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("auditdesk-test-{}", uuid::Uuid::now_v7()))
            .join(name)
    }

    #[tokio::test]
    async fn file_storage_round_trips_and_clears() {
        let storage = FileSessionStorage::new(temp_path("session.json"));
        assert_eq!(storage.load().await.unwrap(), None);

        let s = session();
        storage.save(&s).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(s));

        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let path = temp_path("session.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let err = FileSessionStorage::new(path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
