use async_trait::async_trait;
use bson::{DateTime as BsonDateTime, doc};
use chrono::{DateTime, Utc};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use crate::{
    models::{DbSession, DbSettings, SETTINGS_ID, SessionId},
    storage::{SessionStore, SettingsStore, StoreError, Storage},
};

pub const MONGODB_COLLECTION_SESSIONS: &str = "sessions";
pub const MONGODB_COLLECTION_SETTINGS: &str = "settings";

#[derive(Debug)]
pub struct MongoDBStorage(Client);

impl MongoDBStorage {
    pub async fn new(uri: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self(client))
    }

    fn get_db(&self) -> Database {
        self.0
            .default_database()
            .unwrap_or_else(|| self.0.database("phoenixd_dashboard"))
    }

    fn sessions(&self) -> Collection<DbSession> {
        self.get_db().collection(MONGODB_COLLECTION_SESSIONS)
    }

    fn settings(&self) -> Collection<DbSettings> {
        self.get_db().collection(MONGODB_COLLECTION_SETTINGS)
    }
}

#[async_trait]
impl Storage for MongoDBStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        self.get_db().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MongoDBStorage {
    async fn create_session(&self, session: DbSession) -> Result<(), StoreError> {
        self.sessions().insert_one(session).await?;
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<DbSession>, StoreError> {
        Ok(self.sessions().find_one(doc! { "_id": *id }).await?)
    }

    async fn touch_session(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let result = self
            .sessions()
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "last_used_at": BsonDateTime::from_chrono(now) } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StoreError> {
        let result = self.sessions().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = self
            .sessions()
            .delete_many(doc! { "expires_at": { "$lt": BsonDateTime::from_chrono(now) } })
            .await?;

        debug!(deleted = result.deleted_count, "Deleted expired sessions");
        Ok(result.deleted_count)
    }

    async fn delete_all_sessions(&self) -> Result<u64, StoreError> {
        let result = self.sessions().delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl SettingsStore for MongoDBStorage {
    async fn get_settings(&self) -> Result<DbSettings, StoreError> {
        Ok(self
            .settings()
            .find_one(doc! { "_id": SETTINGS_ID })
            .await?
            .unwrap_or_default())
    }

    async fn put_settings(&self, settings: DbSettings) -> Result<(), StoreError> {
        self.settings()
            .replace_one(doc! { "_id": SETTINGS_ID }, settings)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn set_initial_password(
        &self,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let now = BsonDateTime::from_chrono(now);

        // every other field has a serde default
        self.settings()
            .update_one(
                doc! { "_id": SETTINGS_ID },
                doc! { "$setOnInsert": { "updated_at": now } },
            )
            .upsert(true)
            .await?;

        let result = self
            .settings()
            .update_one(
                doc! { "_id": SETTINGS_ID, "password_hash": null },
                doc! { "$set": { "password_hash": password_hash, "updated_at": now } },
            )
            .await?;

        Ok(result.modified_count == 1)
    }
}
