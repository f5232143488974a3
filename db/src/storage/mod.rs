use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{DbSession, DbSettings, SessionId};

pub mod memory;
pub mod mongodb;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Query Error: {0}")]
    MongoDB(#[from] ::mongodb::error::Error),

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait Storage: SessionStore + SettingsStore + Send + Sync + 'static {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore {
    async fn create_session(&self, session: DbSession) -> Result<(), StoreError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<DbSession>, StoreError>;

    /// Sets `last_used_at` on the session. Fails with `NotFound` if it is
    /// gone.
    async fn touch_session(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Returns whether a session was deleted.
    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError>;

    /// Deletes every session whose `expires_at` lies before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn delete_all_sessions(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait SettingsStore {
    /// The stored settings, or defaults when none were saved yet.
    async fn get_settings(&self) -> Result<DbSettings, StoreError>;

    async fn put_settings(&self, settings: DbSettings) -> Result<(), StoreError>;

    /// Stores the first password hash, unless a password is already set.
    /// Returns whether this call set it.
    async fn set_initial_password(
        &self,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
