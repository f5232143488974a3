use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::SessionId;

pub const CSRF_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSession {
    /// The unique session identifier (signed into the session cookie)
    #[serde(rename = "_id")]
    pub id: SessionId,

    /// CSRF token for this session
    pub csrf_token: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    /// When the session expires, regardless of activity
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,

    /// Last time the session authenticated a request (for the idle lock)
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_used_at: DateTime<Utc>,
}

impl DbSession {
    /// A fresh session valid for `ttl` from `now`.
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let csrf_token: String = rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(CSRF_TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self {
            id: SessionId::generate(),
            csrf_token,
            created_at: now,
            expires_at: now + ttl,
            last_used_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Whether the session sat unused for longer than `auto_lock`.
    pub fn is_idle(&self, now: DateTime<Utc>, auto_lock: Option<Duration>) -> bool {
        match auto_lock {
            Some(limit) => self.last_used_at + limit < now,
            None => false,
        }
    }
}
