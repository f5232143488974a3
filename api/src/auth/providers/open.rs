use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use pdash_common::caller::Caller;
use pdash_db::storage::{SettingsStore, Storage};

use crate::auth::{error::AuthError, provider::AuthProvider};

/// Lets every request through while no dashboard password is set.
pub struct OpenAccessProvider {
    db: Arc<dyn Storage>,
}

impl OpenAccessProvider {
    pub fn new(db: Arc<dyn Storage>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthProvider for OpenAccessProvider {
    async fn authenticate(&self, _parts: &Parts) -> Result<Caller, AuthError> {
        let settings = SettingsStore::get_settings(&*self.db).await?;

        if settings.has_password() {
            Err(AuthError::MissingCredentials)
        } else {
            Ok(Caller::Open)
        }
    }

    fn scheme(&self) -> &'static str {
        "open"
    }
}
