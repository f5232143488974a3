use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    models::{DbSession, DbSettings, SessionId},
    storage::{SessionStore, SettingsStore, StoreError, Storage},
};

/// Process-local storage. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: RwLock<HashMap<SessionId, DbSession>>,
    settings: RwLock<Option<DbSettings>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn create_session(&self, session: DbSession) -> Result<(), StoreError> {
        self.sessions.write().await.insert(session.id, session);
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<DbSession>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn touch_session(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or(StoreError::NotFound)?;
        session.last_used_at = now;
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_all_sessions(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len() as u64;
        sessions.clear();
        Ok(count)
    }
}

#[async_trait]
impl SettingsStore for MemoryStorage {
    async fn get_settings(&self) -> Result<DbSettings, StoreError> {
        Ok(self.settings.read().await.clone().unwrap_or_default())
    }

    async fn put_settings(&self, settings: DbSettings) -> Result<(), StoreError> {
        *self.settings.write().await = Some(settings);
        Ok(())
    }

    async fn set_initial_password(
        &self,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut guard = self.settings.write().await;
        let settings = guard.get_or_insert_with(DbSettings::default);
        if settings.has_password() {
            return Ok(false);
        }

        settings.password_hash = Some(password_hash);
        settings.updated_at = now;
        Ok(true)
    }
}
