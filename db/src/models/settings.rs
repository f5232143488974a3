use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use pdash_common::views::AuthSettings;
use serde::{Deserialize, Serialize};

/// `_id` of the single settings document.
pub const SETTINGS_ID: &str = "dashboard";

pub const DEFAULT_SESSION_TTL_HOURS: u32 = 7 * 24;

/// Dashboard-wide settings. There is exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSettings {
    #[serde(rename = "_id")]
    pub id: String,

    /// bcrypt hash of the dashboard password. `None` leaves the dashboard
    /// open.
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Idle lock in minutes, zero disables it
    #[serde(default)]
    pub auto_lock_minutes: u32,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,

    /// Hex encoded HMAC key for session cookies, generated on first start
    /// when none is configured.
    #[serde(default)]
    pub session_secret: Option<String>,

    #[serde(default)]
    pub phoenixd: DbPhoenixdSettings,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_session_ttl_hours() -> u32 {
    DEFAULT_SESSION_TTL_HOURS
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            password_hash: None,
            auto_lock_minutes: 0,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            session_secret: None,
            phoenixd: DbPhoenixdSettings::default(),
            updated_at: Utc::now(),
        }
    }
}

impl DbSettings {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn auto_lock(&self) -> Option<Duration> {
        match self.auto_lock_minutes {
            0 => None,
            minutes => Some(Duration::minutes(minutes.into())),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.max(1).into())
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            auto_lock_minutes: self.auto_lock_minutes,
            session_ttl_hours: self.session_ttl_hours,
        }
    }
}

/// Operator's choice of phoenixd instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbPhoenixdSettings {
    pub use_external: bool,
    pub external_url: Option<String>,
    pub external_password: Option<String>,
}

impl DbPhoenixdSettings {
    /// URL and password of the external instance, when it is selected and
    /// fully configured.
    pub fn external(&self) -> Option<(&str, &str)> {
        if !self.use_external {
            return None;
        }
        Some((
            self.external_url.as_deref()?,
            self.external_password.as_deref()?,
        ))
    }
}
